use crate::test_support::{eval_json, patient_json};

#[test]
fn test_date_equality() {
    let patient = patient_json();

    let birth_date = eval_json("Patient.birthDate", &patient);
    assert_eq!(birth_date.len(), 1);
    assert_eq!(birth_date.first().unwrap().type_name(), "String");

    let literal = eval_json("@1974-12-25", &patient);
    assert_eq!(literal.first().unwrap().type_name(), "Date");

    // The JSON string is compared as a date against the literal
    assert!(eval_json("Patient.birthDate = @1974-12-25", &patient)
        .as_boolean()
        .unwrap());
    assert!(!eval_json("Patient.birthDate = @1974-12-26", &patient)
        .as_boolean()
        .unwrap());
    assert!(eval_json("Patient.birthDate < @2000-01-01", &patient)
        .as_boolean()
        .unwrap());
    // Month precision against day precision is ambiguous
    assert!(eval_json("Patient.birthDate = @1974-12", &patient).is_empty());
}

#[test]
fn test_converted_date_equality() {
    let patient = patient_json();
    assert!(eval_json("Patient.birthDate.toDate() = @1974-12-25", &patient)
        .as_boolean()
        .unwrap());
    assert!(eval_json("Patient.birthDate.toDate() ~ @1974-12-25", &patient)
        .as_boolean()
        .unwrap());
}
