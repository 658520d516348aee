// Unit tests for the drag token wire format
// Tokens written by other drag sources must decode the same way

use test_case::test_case;
use visit_calendar::models::biomarker::{BiomarkerCategory, BiomarkerPayload};
use visit_calendar::models::patient::{Patient, PatientSummary};
use visit_calendar::services::drag_payload::{DecodeFailure, DragPayloadCodec, DragToken};

fn patient() -> Patient {
    Patient::from_summary(PatientSummary::new(1, "Ada", "Lovelace", "PD10001"))
}

#[test_case(r#"{"biomarkerVal":120,"className":"systolic"}"#, 120.0, BiomarkerCategory::Systolic ; "integer value")]
#[test_case(r#"{"biomarkerVal":3.0,"className":"hba1c"}"#, 3.0, BiomarkerCategory::Hba1c ; "hba1c")]
#[test_case(r#"{"className":"diastolic","biomarkerVal":90}"#, 90.0, BiomarkerCategory::Diastolic ; "field order")]
#[test_case(r#"{"biomarkerVal":4.5,"className":"glucose","extra":true}"#, 4.5, BiomarkerCategory::Glucose ; "extra field ignored")]
fn test_decode_accepts(token: &str, value: f64, category: BiomarkerCategory) {
    let payload = DragPayloadCodec::decode(token).unwrap();
    assert_eq!(payload.value, value);
    assert_eq!(payload.category, category);
}

#[test_case("" ; "empty")]
#[test_case("   " ; "blank")]
fn test_decode_empty(token: &str) {
    assert_eq!(DragPayloadCodec::decode(token), Err(DecodeFailure::Empty));
}

#[test_case("systolic" ; "plain text")]
#[test_case(r#"{"biomarkerVal":"high","className":"systolic"}"# ; "string value")]
#[test_case(r#"{"className":"systolic"}"# ; "missing value")]
#[test_case(r#"[120,"systolic"]"# ; "array")]
#[test_case("120" ; "bare number")]
fn test_decode_malformed(token: &str) {
    assert!(matches!(
        DragPayloadCodec::decode(token),
        Err(DecodeFailure::Malformed(_))
    ));
}

#[test]
fn test_decode_unknown_category() {
    assert_eq!(
        DragPayloadCodec::decode(r#"{"biomarkerVal":1,"className":"cholesterol"}"#),
        Err(DecodeFailure::UnknownCategory("cholesterol".to_string()))
    );
}

#[test]
fn test_encoded_token_decodes_for_every_category() {
    let patient = patient();
    for category in BiomarkerCategory::ALL {
        let payload = BiomarkerPayload::new(7.25, category).unwrap();
        let token = DragPayloadCodec::encode(&payload, Some(&patient)).unwrap();
        let transferred = DragToken::from_transfer(token.into_inner());
        assert_eq!(DragPayloadCodec::decode(transferred.as_str()), Ok(payload));
    }
}
