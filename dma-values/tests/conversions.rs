use std::cmp::Ordering;

use dma_values::{Area, Distance, Duration, Money, Rational, Volume, Weight};

#[test]
fn distance_round_trips_are_stable() {
    for text in ["3 mi 200 ft", "1 ft", "5 mi", "7 in"] {
        let distance: Distance = text.parse().unwrap();
        let metric = distance.as_metric();
        let again = metric.as_feet().as_metric();
        assert_eq!(metric.to_string(), again.to_string(), "{text}");
        assert_eq!(distance.compare(&metric), Ordering::Equal, "{text}");
    }
    let distance: Distance = "3 mi 200 ft".parse().unwrap();
    assert_eq!(distance.as_metric().to_string(), "6 km 416 m");
    assert_eq!(distance.as_metric().as_feet().to_string(), "3 mi 200 ft");
    assert_eq!("1 ft".parse::<Distance>().unwrap().as_metric().to_string(), "40 cm");
}

#[test]
fn reading_order_does_not_matter() {
    let pairs = [
        ("1 km 5 m 40 cm", "40 cm 1 km 5 m"),
        ("2 mi 10 ft 6 in", "6 in 10 ft 2 mi"),
        ("1 mi 1 mi", "2 mi"),
    ];
    for (left, right) in pairs {
        let left: Distance = left.parse().unwrap();
        let right: Distance = right.parse().unwrap();
        assert_eq!(left.compare(&right), Ordering::Equal);
        assert_eq!(left.to_string(), right.to_string());
    }
}

#[test]
fn other_kinds_survive_conversion() {
    let area: Area = "3 sq ft".parse().unwrap();
    assert_eq!(area.compare(&area.as_metric().as_feet()), Ordering::Equal);

    let volume: Volume = "1 gallon 2 quarts".parse().unwrap();
    assert_eq!(volume.compare(&volume.as_liters()), Ordering::Equal);
    assert_eq!(volume.as_liters().as_gallons().to_string(), "1 1/2 gallons");

    let weight: Weight = "2 kg".parse().unwrap();
    assert_eq!(weight.as_pounds().as_metric().to_string(), "2 kg");

    let duration: Duration = "1 hour".parse().unwrap();
    assert_eq!(duration.as_rounds_value(), Rational::from_int(600));
    assert_eq!(duration.as_rounds().as_seconds().to_string(), "1 hour");
}

#[test]
fn money_keeps_its_value_while_simplifying() {
    let money: Money = "1234 cp".parse().unwrap();
    let simplified = money.simplify();
    assert_eq!(simplified.to_string(), "1 pp 2 gp 3 sp 4 cp");
    assert_eq!(money.compare(&simplified), Ordering::Equal);
    assert_eq!(simplified.as_gold().to_string(), "12 17/50");
}
