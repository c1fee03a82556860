use dma_values::{
    Aggregate, Combined, Contribution, Entry, EntryValue, Expression, Modifier, ModifierType,
    Value, ValueKind,
};

/// A catalog entry with named values and the templates it derives from.
struct Item {
    name: &'static str,
    values: Vec<(&'static str, EntryValue<Value>)>,
    bases: Vec<Item>,
}

impl Item {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            values: Vec::new(),
            bases: Vec::new(),
        }
    }

    fn value(mut self, key: &'static str, kind: ValueKind, text: &str) -> Self {
        let value = kind.parse(text).unwrap();
        self.values.push((key, EntryValue::Value(value)));
        self
    }

    fn modifier(mut self, key: &'static str, text: &str) -> Self {
        let modifier: Modifier = text.parse().unwrap();
        self.values.push((key, EntryValue::Modifier(modifier)));
        self
    }

    fn base(mut self, base: Self) -> Self {
        self.bases.push(base);
        self
    }
}

impl Entry for Item {
    type Value = Value;

    fn key(&self) -> &str {
        self.name
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

fn gold(value: &Value) -> String {
    value.as_money().unwrap().as_gold().to_string()
}

#[test]
fn child_and_parent_values_add_up() {
    let longsword = Item::new("longsword")
        .value("weight", ValueKind::Weight, "4 lbs")
        .value("value", ValueKind::Money, "15 gp")
        .base(
            Item::new("sword")
                .value("weight", ValueKind::Weight, "1 lb")
                .value("value", ValueKind::Money, "5 sp"),
        );

    let weight = Combined::collect("weight", &longsword);
    assert_eq!(weight.total().unwrap().unwrap().to_string(), "5 lbs");
    assert_eq!(weight.base().unwrap().unwrap().to_string(), "1 lb");

    let value = Combined::collect("value", &longsword);
    assert_eq!(gold(&value.total().unwrap().unwrap()), "15 1/2");
    assert_eq!(gold(&value.base().unwrap().unwrap()), "1/2");
}

#[test]
fn deep_chains_merge_in_depth_first_order() {
    let item = Item::new("masterwork chain")
        .value("damage", ValueKind::Dice, "1d4")
        .base(
            Item::new("chain")
                .value("damage", ValueKind::Dice, "1d6")
                .base(Item::new("weapon").value("damage", ValueKind::Dice, "+1")),
        )
        .base(Item::new("spiked").value("damage", ValueKind::Dice, "1d4"));

    let damage = Combined::collect("damage", &item);
    let values: Vec<String> = damage
        .values_only()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(values, ["2d4", "1d6 +1"]);
    assert!(damage.total().is_err());
}

#[test]
fn magic_enhancements_stack_onto_the_price() {
    let mut armor = Combined::collect(
        "value",
        &Item::new("breastplate").value("value", ValueKind::Money, "200 gp"),
    );
    armor.add_expression(Contribution::new(
        Expression::MagicArmor { plus: 1 },
        "enhancement",
        "first",
    ));
    armor.add_expression(Contribution::new(
        Expression::MagicArmor { plus: 1 },
        "enhancement",
        "second",
    ));
    assert_eq!(gold(&armor.total().unwrap().unwrap()), "4200");

    armor.add_expression(Contribution::untitled(
        "[* 1/2]".parse().unwrap(),
        "secondhand",
    ));
    assert_eq!(gold(&armor.total().unwrap().unwrap()), "2100");

    armor.add_expression(Contribution::untitled(
        "[= 5 gp]".parse().unwrap(),
        "bargain",
    ));
    assert_eq!(armor.total().unwrap().unwrap().to_string(), "5 gp");
}

#[test]
fn weapon_and_armor_enhancements_are_priced_separately() {
    let mut shield = Combined::collect(
        "value",
        &Item::new("spiked shield").value("value", ValueKind::Money, "10 gp"),
    );
    for expression in ["[magic armor(1)]", "[magic weapon(1)]", "[magic weapon(2)]"] {
        shield.add_expression(Contribution::untitled(
            expression.parse().unwrap(),
            "enhancement",
        ));
    }
    // 1000 for the armor, 2000 + 16000 for the weapon.
    assert_eq!(gold(&shield.total().unwrap().unwrap()), "19010");
}

#[test]
fn priced_items_without_a_base_value() {
    let mut wand = Combined::<Value>::new("value", "wand of fireball");
    wand.add_expression(Contribution::untitled(
        "[wand(3)]".parse().unwrap(),
        "magic",
    ));
    assert_eq!(gold(&wand.total().unwrap().unwrap()), "225");
    assert!(!wand.has_value());
    assert_eq!(wand.top_value(), None);
}

#[test]
fn armor_class_uses_modifiers() {
    let fighter = Item::new("fighter")
        .value("armor class", ValueKind::Number, "10")
        .base(Item::new("chain shirt").modifier("armor class", "+4 armor"))
        .base(Item::new("buckler").modifier("armor class", "+1 shield"))
        .base(Item::new("ring").modifier("armor class", "+1 deflection if \"not flat-footed\""));

    let mut armor_class = Combined::collect("armor class", &fighter);
    assert!(armor_class.has_modifiers());
    assert_eq!(armor_class.modifier().to_string(), "15-16");

    let mut shield = Combined::collect(
        "armor class",
        &Item::new("tower shield").modifier("armor class", "+4 shield"),
    );
    shield.add_modifier(Contribution::new(
        Modifier::new(1, ModifierType::Dodge),
        "feat",
        "dodge",
    ));
    armor_class.add(&shield, "tower shield");
    let number = armor_class.modifier();
    // shield bonuses do not stack, so only the larger one counts
    assert_eq!(number.to_string(), "19-20");
    assert_eq!(number.modifiers().len(), 6);
}

#[test]
fn merged_trees_report_their_sources() {
    let mut pack = Combined::collect(
        "weight",
        &Item::new("backpack").value("weight", ValueKind::Weight, "2 lbs"),
    );
    let rope = Combined::collect(
        "weight",
        &Item::new("rope").value("weight", ValueKind::Weight, "10 lbs"),
    );
    let torch = Combined::collect(
        "weight",
        &Item::new("torch").value("weight", ValueKind::Weight, "1 lb"),
    );
    pack.add(&rope, "contents");
    pack.add(&torch, "contents");

    let described = pack.values_with_descriptions();
    assert_eq!(described.len(), 1);
    assert_eq!(described[0].0.to_string(), "13 lbs");
    assert_eq!(described[0].1, "contents, contents");
    assert_eq!(pack.top_value().map(ToString::to_string), Some("2 lbs".to_string()));
}
