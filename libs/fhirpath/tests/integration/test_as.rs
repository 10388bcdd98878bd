use ferrum_path::Error;
use serde_json::{json, Value as JsonValue};

use crate::test_support::{engine, eval_json};

fn blood_pressure() -> JsonValue {
    json!({
        "resourceType": "Observation",
        "component": [
            {
                "code": {"text": "Systolic BP"},
                "valueQuantity": {
                    "value": 120,
                    "unit": "mmHg",
                    "system": "http://unitsofmeasure.org",
                    "code": "mm[Hg]"
                }
            },
            {
                "code": {"text": "Diastolic BP"},
                "valueQuantity": {
                    "value": 80,
                    "unit": "mmHg",
                    "system": "http://unitsofmeasure.org",
                    "code": "mm[Hg]"
                }
            },
            {
                "code": {"text": "Comment"},
                "valueString": "Normal reading"
            }
        ]
    })
}

#[test]
fn test_as_quantity() {
    let obs = json!({
      "resourceType": "Observation",
      "valueQuantity": {
        "value": 185,
        "unit": "lbs",
        "system": "http://unitsofmeasure.org",
        "code": "[lb_av]"
      }
    });

    assert_eq!(eval_json("Observation.valueQuantity", &obs).len(), 1);
    assert_eq!(eval_json("Observation.value", &obs).len(), 1);
    assert!(eval_json("Observation.value is Quantity", &obs)
        .as_boolean()
        .unwrap());
    assert!(!eval_json("Observation.value is String", &obs)
        .as_boolean()
        .unwrap());

    let quantity = eval_json("Observation.value.as(Quantity)", &obs);
    assert_eq!(quantity.len(), 1, "as(Quantity) should return the item");

    let unit = eval_json("Observation.value.as(Quantity).unit", &obs);
    assert_eq!(&*unit.as_string().unwrap(), "lbs");

    assert!(eval_json("Observation.value.as(String)", &obs).is_empty());
    assert!(eval_json("(Observation.value as Quantity) > 100 'lbs'", &obs).is_empty());
    assert!(eval_json("(Observation.value as Quantity) > 100 '[lb_av]'", &obs)
        .as_boolean()
        .unwrap());
}

#[test]
fn test_as_with_multi_item_collection() {
    let obs = blood_pressure();

    // as() is a singleton operation; multi-item input is rejected
    let err = engine()
        .evaluate_json("Observation.component.value.as(Quantity)", &obs)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperand(_)));
    let err = engine()
        .evaluate_json("Observation.component.value is Quantity", &obs)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperand(_)));

    // Per-item conversion goes through select()
    let units = eval_json("Observation.component.select(value.as(Quantity)).unit", &obs);
    assert_eq!(units.len(), 2, "Should get units from both quantities");
}

#[test]
fn test_of_type_filters_multi_item_collection() {
    let obs = blood_pressure();

    let quantities = eval_json("Observation.component.value.ofType(Quantity)", &obs);
    assert_eq!(quantities.len(), 2);

    let strings = eval_json("Observation.component.value.ofType(String)", &obs);
    assert_eq!(strings.len(), 1);
    assert_eq!(&*strings.as_string().unwrap(), "Normal reading");

    let qualified = eval_json("Observation.component.value.ofType(System.String)", &obs);
    assert_eq!(qualified.len(), 1);

    let combo = eval_json(
        "(Observation.component.value.ofType(Quantity)) | (Observation.component.value.ofType(String))",
        &obs,
    );
    assert_eq!(combo.len(), 3, "Combined expression should return all 3 component values");
}
