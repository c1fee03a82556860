//! Evaluate one input in the requested mode.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use dma_values::{
    Comment, Dice, DiceBag, EngineConfig, Expression, ParseReader, Rational, UnitKind, Units,
    Value, ValueKind,
};

use crate::Mode;

/// Everything a calculation needs besides the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub input: String,
    pub to: Option<String>,
    pub simplify: bool,
    pub rolls: usize,
    pub seed: Option<u64>,
    pub base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detail {
    pub label: &'static str,
    pub value: String,
}

impl Detail {
    fn new(label: &'static str, value: impl ToString) -> Self {
        Self {
            label,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Calculation {
    pub mode: &'static str,
    pub input: String,
    pub value: String,
    pub details: Vec<Detail>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rolls: Vec<i64>,
}

impl Calculation {
    fn new(mode: Mode, request: &Request, value: impl ToString) -> Self {
        Self {
            mode: mode.name(),
            input: request.input.clone(),
            value: value.to_string(),
            details: Vec::new(),
            rolls: Vec::new(),
        }
    }

    fn detail(mut self, label: &'static str, value: impl ToString) -> Self {
        self.details.push(Detail::new(label, value));
        self
    }
}

/// Run `request` in `mode`.
///
/// # Errors
///
/// Fails when the input cannot be read in the requested mode or a target
/// unit set does not exist.
pub fn evaluate(mode: Mode, request: &Request, config: &EngineConfig) -> Result<Calculation> {
    log::debug!("evaluating '{}' as {}", request.input, mode.name());
    match mode {
        Mode::Rational => rational(request),
        Mode::Dice => dice(request, config),
        Mode::Expression => expression(request),
        Mode::Comment => Ok(comment(request, config)),
        measurement_mode => {
            let kind = measurement_mode.value_kind().context("mode has no value kind")?;
            let value = kind
                .parse(&request.input)
                .with_context(|| format!("reading {kind} from '{}'", request.input))?;
            measurement(measurement_mode, request, config.simplify.apply(value))
        }
    }
}

fn rational(request: &Request) -> Result<Calculation> {
    let value: Rational = request
        .input
        .parse()
        .with_context(|| format!("reading a rational from '{}'", request.input))?;
    Ok(Calculation::new(Mode::Rational, request, &value)
        .detail("decimal", value.as_f64())
        .detail("markup", value.to_fraction_markup()))
}

fn dice(request: &Request, config: &EngineConfig) -> Result<Calculation> {
    let dice: Dice = request
        .input
        .parse()
        .with_context(|| format!("reading dice from '{}'", request.input))?;
    let mut calculation = Calculation::new(Mode::Dice, request, &dice)
        .detail("min", dice.min())
        .detail("max", dice.max())
        .detail("average", dice.average());
    if request.rolls > 0 {
        let mut bag = request
            .seed
            .map_or_else(|| config.dice_bag(), DiceBag::from_seed);
        calculation.rolls = bag.roll_many(&dice, request.rolls);
        calculation = calculation.detail("seed", bag.seed());
        log::debug!("rolled {} with {} draws", dice, bag.draws());
    }
    Ok(calculation)
}

fn expression(request: &Request) -> Result<Calculation> {
    let expression: Expression = request
        .input
        .parse()
        .with_context(|| format!("reading an expression from '{}'", request.input))?;
    let base = request
        .base
        .as_deref()
        .map(|text| {
            ValueKind::Money
                .parse(text)
                .with_context(|| format!("reading a base price from '{text}'"))
        })
        .transpose()?;
    let result = Expression::compute_all(std::slice::from_ref(&expression), base);
    let result = result.map_or_else(|| "undefined".to_string(), |value| value.to_string());
    Ok(Calculation::new(Mode::Expression, request, &expression)
        .detail("priority", expression.priority())
        .detail("result", result))
}

fn comment(request: &Request, config: &EngineConfig) -> Calculation {
    let template = config.comment.template();
    let mut reader = ParseReader::new(&request.input);
    let read = template.read(&mut reader);
    let text = read
        .as_ref()
        .and_then(Comment::text)
        .unwrap_or_default()
        .to_string();
    let fixed = read
        .as_ref()
        .map(Comment::fix)
        .and_then(|fixed| fixed.text().map(str::to_string))
        .unwrap_or_default();
    Calculation::new(Mode::Comment, request, text)
        .detail("valid", template.check(&request.input))
        .detail("fixed", fixed)
        .detail("rest", reader.rest())
}

fn measurement(mode: Mode, request: &Request, value: Value) -> Result<Calculation> {
    let calculation = match value {
        Value::Distance(units) => describe_units(mode, request, units)?,
        Value::Area(units) => describe_units(mode, request, units)?,
        Value::Duration(units) => describe_units(mode, request, units)?,
        Value::Volume(units) => describe_units(mode, request, units)?,
        Value::Weight(units) => describe_units(mode, request, units)?,
        Value::Money(units) => {
            let gold = units.as_gold();
            describe_units(mode, request, units)?.detail("gold", gold)
        }
        other => bail!("{} is not a measurement", other.kind()),
    };
    Ok(calculation)
}

fn describe_units<K: UnitKind>(
    mode: Mode,
    request: &Request,
    units: Units<K>,
) -> Result<Calculation> {
    let units = match request.to.as_deref() {
        Some(name) => {
            let family = K::family();
            let Some(index) = family.index_of(name) else {
                let known: Vec<&str> = family.sets().iter().map(|set| set.name()).collect();
                bail!("unknown {} units '{name}' (known: {})", K::NAME, known.join(", "));
            };
            units.to_set(index, request.simplify)?
        }
        None if request.simplify => units.simplify(),
        None => units,
    };
    let set = units
        .active_set()
        .map_or_else(|| "undefined".to_string(), |set| set.name().to_string());
    Ok(Calculation::new(mode, request, &units)
        .detail("short", units.to_short_string())
        .detail("set", set)
        .detail("base", format!("{} {}", units.as_base(), units.base_unit())))
}
