//! Aggregation of a named value over an entry and everything it derives from.
//!
//! [`Combined::collect`] walks an entry and its base entries and records one
//! [`Node`] per entry. Values of the same kind are summed when flattened;
//! modifiers and cost expressions are kept on the side and applied to the
//! totals.

use std::fmt;

use crate::error::Result;
use crate::expression::Expression;
use crate::modifier::{ModifiedNumber, Modifier};
use crate::value::Aggregate;

/// What an entry stores under a name: a plain value or a modifier to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue<T> {
    Value(T),
    Modifier(Modifier),
}

/// Anything that holds named values and may derive from base entries.
pub trait Entry {
    type Value: Aggregate;

    /// Identifies the entry in descriptions.
    fn key(&self) -> &str;

    fn get_value(&self, name: &str) -> Option<EntryValue<Self::Value>>;

    /// The entries this one derives from; empty for a root entry.
    fn base_entries(&self) -> Vec<&Self>;
}

/// One entry's value in the derivation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    value: Option<T>,
    entry: String,
    description: Option<String>,
    children: Vec<Node<T>>,
}

impl<T: Aggregate> Node<T> {
    #[must_use]
    pub fn new(value: Option<T>, entry: &str) -> Self {
        Self {
            value,
            entry: entry.to_string(),
            description: None,
            children: Vec::new(),
        }
    }

    /// A copy of this subtree with `description` appended to every node.
    #[must_use]
    pub fn as_described(&self, description: &str) -> Self {
        let combined = match &self.description {
            Some(existing) => format!("{existing}, {description}"),
            None => description.to_string(),
        };
        Self {
            value: self.value.clone(),
            entry: self.entry.clone(),
            description: Some(combined),
            children: self
                .children
                .iter()
                .map(|child| child.as_described(description))
                .collect(),
        }
    }

    pub fn add_child(&mut self, node: Self) {
        self.children.push(node);
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Depth first: this node's own value, then the children's, with values
    /// of the same kind summed.
    fn flatten(&self, include_own: bool) -> Vec<Flat<'_, T>> {
        let mut values = Vec::new();
        if include_own && let Some(value) = self.value.as_ref().filter(|value| value.is_defined()) {
            values.push(Flat {
                value: value.clone(),
                nodes: vec![self],
            });
        }
        for child in &self.children {
            for flat in child.flatten(true) {
                merge(&mut values, flat);
            }
        }
        values
    }
}

impl<T: fmt::Display> fmt::Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", self.entry)?;
        match &self.value {
            Some(value) => write!(f, "{value}")?,
            None => f.write_str("-")?,
        }
        if !self.children.is_empty() {
            f.write_str(" [")?;
            for (index, child) in self.children.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// A summed value and the nodes it came from.
struct Flat<'a, T> {
    value: T,
    nodes: Vec<&'a Node<T>>,
}

fn merge<'a, T: Aggregate>(values: &mut Vec<Flat<'a, T>>, flat: Flat<'a, T>) {
    for existing in values.iter_mut() {
        if existing.value.kind_name() != flat.value.kind_name()
            || !existing.value.can_add(&flat.value)
        {
            continue;
        }
        match existing.value.add(&flat.value) {
            Ok(sum) => {
                existing.value = sum;
                existing.nodes.extend(flat.nodes);
                return;
            }
            Err(err) => log::debug!("not merging {} into {}: {err}", flat.value, existing.value),
        }
    }
    if !values.is_empty() {
        log::debug!("keeping {} as a separate value", flat.value);
    }
    values.push(flat);
}

/// A value added from outside the derivation tree, such as a bonus granted
/// by an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution<V> {
    value: V,
    group: String,
    text: Option<String>,
}

impl<V> Contribution<V> {
    #[must_use]
    pub fn new(value: V, group: &str, text: &str) -> Self {
        Self {
            value,
            group: group.to_string(),
            text: Some(text.to_string()),
        }
    }

    #[must_use]
    pub fn untitled(value: V, group: &str) -> Self {
        Self {
            value,
            group: group.to_string(),
            text: None,
        }
    }

    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// `"group (text)"`, or just the group without text.
    #[must_use]
    pub fn description(&self) -> String {
        match &self.text {
            Some(text) => format!("{} ({text})", self.group),
            None => self.group.clone(),
        }
    }
}

impl<V: fmt::Display> fmt::Display for Contribution<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description(), self.value)
    }
}

/// The combination of all values stored under one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combined<T> {
    name: String,
    entry: String,
    root: Option<Node<T>>,
    values: Vec<Contribution<T>>,
    modifiers: Vec<Contribution<Modifier>>,
    expressions: Vec<Contribution<Expression>>,
}

impl<T: Aggregate> Combined<T> {
    /// Nothing collected yet.
    #[must_use]
    pub fn new(name: &str, entry: &str) -> Self {
        Self {
            name: name.to_string(),
            entry: entry.to_string(),
            root: None,
            values: Vec::new(),
            modifiers: Vec::new(),
            expressions: Vec::new(),
        }
    }

    /// Gather `name` from `entry` and, recursively, its base entries.
    ///
    /// Modifier values go to the modifier list; every other entry gets a
    /// node, with or without a value.
    pub fn collect<E: Entry<Value = T>>(name: &str, entry: &E) -> Self {
        let mut combined = Self::new(name, entry.key());
        combined.root = combined.collect_node(entry);
        combined
    }

    fn collect_node<E: Entry<Value = T>>(&mut self, entry: &E) -> Option<Node<T>> {
        let mut root = match entry.get_value(&self.name) {
            Some(EntryValue::Modifier(modifier)) => {
                self.add_modifier(Contribution::new(modifier, entry.key(), "collect"));
                None
            }
            Some(EntryValue::Value(value)) => Some(Node::new(Some(value), entry.key())),
            None => Some(Node::new(None, entry.key())),
        };
        for base in entry.base_entries() {
            let Some(child) = self.collect_node(base) else {
                continue;
            };
            match &mut root {
                Some(node) => node.add_child(child),
                None => root = Some(child),
            }
        }
        root
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the entry the values were collected for.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    #[must_use]
    pub const fn root(&self) -> Option<&Node<T>> {
        self.root.as_ref()
    }

    /// Contributed values join the tree as described children of the root,
    /// so they merge with collected values of the same kind. Without a root
    /// they are kept on the side.
    pub fn add_value(&mut self, contribution: Contribution<T>) {
        match &mut self.root {
            Some(root) => {
                let description = contribution.description();
                root.add_child(Node {
                    value: Some(contribution.value),
                    entry: contribution.group,
                    description: Some(description),
                    children: Vec::new(),
                });
            }
            None => self.values.push(contribution),
        }
    }

    pub fn add_modifier(&mut self, contribution: Contribution<Modifier>) {
        self.modifiers.push(contribution);
    }

    pub fn add_expression(&mut self, contribution: Contribution<Expression>) {
        self.expressions.push(contribution);
    }

    /// Merge another aggregation: its tree becomes a described child and its
    /// modifiers are taken over.
    pub fn add(&mut self, other: &Self, description: &str) {
        if let Some(other_root) = &other.root {
            let described = other_root.as_described(description);
            match &mut self.root {
                Some(root) => root.add_child(described),
                None => self.root = Some(described),
            }
        }
        self.modifiers.extend(other.modifiers.iter().cloned());
    }

    /// Flattened tree values. A trailing plain number is dropped when
    /// modifiers exist, as it is already part of [`Self::modifier`].
    fn flat_values(&self, include_root: bool) -> Vec<Flat<'_, T>> {
        let Some(root) = &self.root else {
            return Vec::new();
        };
        let mut values = root.flatten(include_root);
        if !self.modifiers.is_empty()
            && let Some(last) = values.last()
            && last.value.as_number().is_some()
        {
            log::debug!("dropping {} from {}, covered by modifiers", last.value, self.name);
            values.pop();
        }
        values
    }

    /// All flattened values followed by the contributed ones.
    #[must_use]
    pub fn values_only(&self) -> Vec<T> {
        self.flat_values(true)
            .into_iter()
            .map(|flat| flat.value)
            .chain(self.values.iter().map(|contribution| contribution.value.clone()))
            .collect()
    }

    /// Like [`Self::values_only`], paired with where each value came from.
    #[must_use]
    pub fn values_with_descriptions(&self) -> Vec<(T, String)> {
        let mut values: Vec<(T, String)> = self
            .flat_values(true)
            .into_iter()
            .map(|flat| {
                let descriptions: Vec<&str> = flat
                    .nodes
                    .iter()
                    .filter_map(|node| node.description())
                    .collect();
                (flat.value, descriptions.join(", "))
            })
            .collect();
        values.extend(
            self.values
                .iter()
                .map(|contribution| (contribution.value.clone(), contribution.description())),
        );
        values
    }

    /// Sum of all values, with expressions applied and units simplified.
    ///
    /// # Errors
    ///
    /// Fails if the values cannot be added, e.g. dice with different sides or
    /// values of different kinds.
    pub fn total(&self) -> Result<Option<T>> {
        self.sum(self.values_only())
    }

    /// The total without the value stored on the entry itself.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::total`].
    pub fn base(&self) -> Result<Option<T>> {
        let values = self
            .flat_values(false)
            .into_iter()
            .map(|flat| flat.value)
            .chain(self.values.iter().map(|contribution| contribution.value.clone()))
            .collect();
        self.sum(values)
    }

    fn sum(&self, values: Vec<T>) -> Result<Option<T>> {
        let mut total: Option<T> = None;
        for value in values {
            total = Some(match total {
                Some(total) => total.add(&value)?,
                None => value,
            });
        }
        Ok(self.finish(total))
    }

    /// Smallest value, with expressions applied.
    #[must_use]
    pub fn min(&self) -> Option<T> {
        self.pick(std::cmp::Ordering::Less)
    }

    /// Largest value, with expressions applied.
    #[must_use]
    pub fn max(&self) -> Option<T> {
        self.pick(std::cmp::Ordering::Greater)
    }

    fn pick(&self, wanted: std::cmp::Ordering) -> Option<T> {
        let picked = self.values_only().into_iter().reduce(|best, value| {
            if value.compare(&best) == Some(wanted) {
                value
            } else {
                best
            }
        });
        self.finish(picked)
    }

    /// Cost expressions also price an absent value.
    fn finish(&self, value: Option<T>) -> Option<T> {
        if self.expressions.is_empty() {
            return value.map(|value| value.simplified());
        }
        let expressions: Vec<Expression> = self
            .expressions
            .iter()
            .map(|contribution| contribution.value.clone())
            .collect();
        Expression::compute_all(&expressions, value).map(|value| value.simplified())
    }

    #[must_use]
    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }

    #[must_use]
    pub fn has_value(&self) -> bool {
        !self.values_only().is_empty()
    }

    /// The collected modifiers together with trailing plain numbers from the
    /// tree, as a number based on zero.
    #[must_use]
    pub fn modifier(&self) -> ModifiedNumber {
        let mut number = self.modifiers.iter().fold(ModifiedNumber::new(0), |number, contribution| {
            number.with_merged_modifier(contribution.value.clone(), &contribution.description())
        });

        let Some(root) = &self.root else {
            return number;
        };
        if let Some(last) = root.flatten(true).last()
            && last.value.as_number().is_some()
        {
            for node in &last.nodes {
                let Some(value) = node.value().and_then(Aggregate::as_number) else {
                    continue;
                };
                let name = node.description().unwrap_or(node.entry());
                number = number.with_merged_modifier(Modifier::general(value), name);
            }
        }
        number
    }

    /// The value stored on the entry itself.
    #[must_use]
    pub fn top_value(&self) -> Option<&T> {
        self.root.as_ref().and_then(Node::value)
    }

    /// Whether the entry itself stores the value, so it can be changed there.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.top_value().is_some()
    }
}

impl<T: fmt::Display> fmt::Display for Combined<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): ", self.name, self.entry)?;
        match &self.root {
            Some(root) => write!(f, "{root}")?,
            None => f.write_str("-")?,
        }
        write_list(f, "modifiers", &self.modifiers)?;
        write_list(f, "values", &self.values)?;
        write_list(f, "expressions", &self.expressions)
    }
}

fn write_list<V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    items: &[Contribution<V>],
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    write!(f, ", {label} [")?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str("; ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::units::{Money, Weight};
    use crate::value::{Value, ValueKind};

    struct Sheet {
        key: &'static str,
        values: Vec<(&'static str, EntryValue<Value>)>,
        bases: Vec<Sheet>,
    }

    impl Sheet {
        fn new(key: &'static str) -> Self {
            Self {
                key,
                values: Vec::new(),
                bases: Vec::new(),
            }
        }

        fn with(mut self, name: &'static str, kind: ValueKind, text: &str) -> Self {
            self.values.push((name, EntryValue::Value(kind.parse(text).unwrap())));
            self
        }

        fn with_modifier(mut self, name: &'static str, modifier: Modifier) -> Self {
            self.values.push((name, EntryValue::Modifier(modifier)));
            self
        }

        fn based_on(mut self, base: Self) -> Self {
            self.bases.push(base);
            self
        }
    }

    impl Entry for Sheet {
        type Value = Value;

        fn key(&self) -> &str {
            self.key
        }

        fn get_value(&self, name: &str) -> Option<EntryValue<Value>> {
            self.values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        }

        fn base_entries(&self) -> Vec<&Self> {
            self.bases.iter().collect()
        }
    }

    fn weight(text: &str) -> Value {
        Value::Weight(text.parse::<Weight>().unwrap())
    }

    fn sword() -> Sheet {
        Sheet::new("sword")
            .with("weight", ValueKind::Weight, "3 lbs")
            .based_on(Sheet::new("base sword").with("weight", ValueKind::Weight, "2 lbs"))
    }

    #[test]
    fn totals_sum_entry_and_bases() {
        let combined = Combined::collect("weight", &sword());
        assert_eq!(combined.total().unwrap(), Some(weight("5 lbs")));
        assert_eq!(combined.base().unwrap(), Some(weight("2 lbs")));
        assert_eq!(combined.top_value(), Some(&weight("3 lbs")));
        assert!(combined.is_editable());
        assert!(combined.has_value());
        assert_eq!(combined.min(), Some(weight("5 lbs")));
        assert_eq!(combined.entry(), "sword");
    }

    #[test]
    fn entries_without_values_still_get_nodes() {
        let sheet = Sheet::new("dagger").based_on(Sheet::new("base dagger").with(
            "weight",
            ValueKind::Weight,
            "1 lb",
        ));
        let combined = Combined::collect("weight", &sheet);
        assert!(!combined.is_editable());
        assert_eq!(combined.top_value(), None);
        assert_eq!(combined.total().unwrap(), Some(weight("1 lb")));
        assert_eq!(combined.root().map(|root| root.children().len()), Some(1));

        let empty = Combined::collect("hp", &sheet);
        assert!(!empty.has_value());
        assert_eq!(empty.total().unwrap(), None);
        assert_eq!(empty.min(), None);
    }

    #[test]
    fn unmergeable_values_stay_separate() {
        let sheet = Sheet::new("spell")
            .with("damage", ValueKind::Dice, "1d6")
            .based_on(Sheet::new("fire").with("damage", ValueKind::Dice, "2d8"))
            .based_on(Sheet::new("acid").with("damage", ValueKind::Dice, "1d6+1"));
        let combined = Combined::collect("damage", &sheet);
        let values: Vec<String> = combined.values_only().iter().map(ToString::to_string).collect();
        assert_eq!(values, ["2d6 +1", "2d8"]);
        assert!(matches!(combined.total(), Err(ValueError::IncompatibleDice { .. })));
        assert_eq!(combined.max().map(|value| value.to_string()), Some("2d8".to_string()));
        assert_eq!(combined.min().map(|value| value.to_string()), Some("2d6 +1".to_string()));
    }

    #[test]
    fn mixed_kinds_fail_to_total() {
        let sheet = Sheet::new("door")
            .with("size", ValueKind::Distance, "10 ft")
            .based_on(Sheet::new("portal").with("size", ValueKind::Number, "3"));
        let combined = Combined::collect("size", &sheet);
        assert_eq!(combined.values_only().len(), 2);
        assert_eq!(
            combined.total(),
            Err(ValueError::IncompatibleKinds {
                left: "distance",
                right: "number"
            })
        );
    }

    #[test]
    fn modifiers_replace_trailing_numbers() {
        let sheet = Sheet::new("fighter")
            .with("armor class", ValueKind::Number, "10")
            .based_on(Sheet::new("elf").with_modifier(
                "armor class",
                Modifier::new(2, crate::modifier::ModifierType::Dodge),
            ));
        let mut combined = Combined::collect("armor class", &sheet);
        assert!(combined.has_modifiers());
        assert!(combined.values_only().is_empty());
        assert_eq!(combined.total().unwrap(), None);
        assert_eq!(combined.modifier().to_string(), "12");
        assert_eq!(combined.modifier().modifiers().len(), 2);
        assert!(combined.modifier().modifiers().contains_key("elf (collect)"));

        combined.add_modifier(Contribution::new(
            Modifier::general(1).with_condition("flanking"),
            "feat",
            "flank",
        ));
        assert_eq!(combined.modifier().to_string(), "12-13");
    }

    #[test]
    fn merging_describes_the_other_tree() {
        let sword_sheet = Sheet::new("sword").with("weight", ValueKind::Weight, "3 lbs");
        let scabbard_sheet = Sheet::new("scabbard").with("weight", ValueKind::Weight, "1 lb");
        let mut sword = Combined::collect("weight", &sword_sheet);
        let scabbard = Combined::collect("weight", &scabbard_sheet);
        sword.add(&scabbard, "scabbard");
        sword.add_value(Contribution::new(weight("2 lbs"), "pack", "strap"));

        assert_eq!(sword.total().unwrap(), Some(weight("6 lbs")));
        let described: Vec<(String, String)> = sword
            .values_with_descriptions()
            .into_iter()
            .map(|(value, description)| (value.to_string(), description))
            .collect();
        assert_eq!(
            described,
            [("6 lbs".to_string(), "scabbard, pack (strap)".to_string())]
        );
        let strap = sword.root().map(|root| &root.children()[1]).unwrap();
        assert_eq!(strap.entry(), "pack");
        assert_eq!(strap.description(), Some("pack (strap)"));
    }

    #[test]
    fn contributed_values_join_the_tree() {
        let mut damage = Combined::collect(
            "damage",
            &Sheet::new("club").with("damage", ValueKind::Dice, "1d6"),
        );
        damage.add_value(Contribution::new(
            ValueKind::Dice.parse("2d8").unwrap(),
            "giant",
            "size",
        ));
        damage.add_value(Contribution::untitled(
            ValueKind::Dice.parse("1d6").unwrap(),
            "spiked",
        ));
        assert_eq!(damage.root().map(|root| root.children().len()), Some(2));
        assert_eq!(
            damage.max().map(|value| value.to_string()),
            Some("2d8".to_string())
        );
        let described: Vec<(String, String)> = damage
            .values_with_descriptions()
            .into_iter()
            .map(|(value, description)| (value.to_string(), description))
            .collect();
        assert_eq!(
            described,
            [
                ("2d6".to_string(), "spiked".to_string()),
                ("2d8".to_string(), "giant (size)".to_string()),
            ]
        );
    }

    #[test]
    fn contributed_values_count_without_a_tree() {
        let mut weight_only: Combined<Value> = Combined::new("weight", "bundle");
        weight_only.add_value(Contribution::untitled(weight("2 lbs"), "rope"));
        weight_only.add_value(Contribution::untitled(weight("5 lbs"), "tent"));
        assert_eq!(weight_only.max(), Some(weight("5 lbs")));
        assert_eq!(weight_only.min(), Some(weight("2 lbs")));
        assert!(weight_only.root().is_none());
    }

    #[test]
    fn nested_descriptions_accumulate() {
        let node = Node::<Value>::new(Some(Value::Number(1)), "inner");
        let mut outer = Node::new(None, "outer");
        outer.add_child(node);
        let described = outer.as_described("first").as_described("second");
        assert_eq!(described.description(), Some("first, second"));
        assert_eq!(described.children()[0].description(), Some("first, second"));
        assert_eq!(described.to_string(), "outer = - [inner = 1]");
    }

    #[test]
    fn expressions_apply_to_totals() {
        let mut combined: Combined<Money> = Combined::new("value", "chain mail");
        combined.add_value(Contribution::untitled("150 gp".parse().unwrap(), "chain mail"));
        combined.add_expression(Contribution::new(
            Expression::MagicArmor { plus: 1 },
            "enhancement",
            "+1",
        ));
        let total = combined.total().unwrap().unwrap();
        assert_eq!(total.as_gold().to_string(), "1150");
        assert!(combined.to_string().starts_with("value (chain mail): -"));
    }
}
