use proptest::prelude::*;
use rstest::rstest;

use super::*;

#[rstest]
#[case("count")]
#[case("_private")]
#[case("x1")]
#[case("Learning_Rate_2")]
#[case("_")]
fn accepts_lua_names(#[case] id: &str) {
	assert_eq!(validate_identifier(id), Ok(()));
}

#[rstest]
#[case("1abc")]
#[case("has space")]
#[case("dash-ed")]
#[case("dotted.name")]
#[case("é")]
fn rejects_non_names(#[case] id: &str) {
	assert_eq!(validate_identifier(id), Err(IdentifierError::Lexical(id.to_string())));
}

#[test]
fn rejects_every_reserved_word() {
	for word in ident::RESERVED_WORDS {
		assert_eq!(validate_identifier(word), Err(IdentifierError::Reserved(word.to_string())));
	}
	// Case sensitive, like the language.
	assert!(is_identifier("End"));
	assert!(is_identifier("nil_value"));
}

#[test]
fn rejects_empty() {
	assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
}

#[test]
fn scalar_tokens_round_trip() {
	for kind in ScalarKind::ALL {
		assert_eq!(ScalarKind::from_token(kind.token()), Some(kind));
	}
	assert_eq!(ScalarKind::from_token('a'), None);
	assert_eq!(ScalarKind::Double.to_string(), "double");
}

#[rstest]
#[case(Value::Int(3), ScalarKind::Double, Some(Value::Double(3.0)))]
#[case(Value::Double(4.0), ScalarKind::Int, Some(Value::Int(4)))]
#[case(Value::Double(4.5), ScalarKind::Int, None)]
#[case(Value::Double(f64::NAN), ScalarKind::Int, None)]
#[case(Value::Double(1e300), ScalarKind::Int, None)]
#[case(Value::Int(1), ScalarKind::Bool, None)]
#[case(Value::Int(1), ScalarKind::String, None)]
#[case(Value::from("x"), ScalarKind::String, Some(Value::from("x")))]
#[case(Value::Bool(false), ScalarKind::Bool, Some(Value::Bool(false)))]
fn coercions(#[case] value: Value, #[case] kind: ScalarKind, #[case] expected: Option<Value>) {
	assert_eq!(value.coerce_to(kind), expected);
	assert_eq!(value.fits(kind), expected.is_some());
}

#[test]
fn element_kinds_match_values() {
	assert_eq!(<i64 as Element>::KIND, ScalarKind::Int);
	assert_eq!(7i64.into_value().kind(), Some(ScalarKind::Int));
	assert_eq!(<f64 as Element>::from_value(&Value::Int(2)), Some(2.0));
	assert_eq!(<String as Element>::from_value(&Value::Int(2)), None);
	assert_eq!(Value::from(vec![1i64, 2]).type_name(), "array");
}

proptest! {
	#[test]
	fn generated_names_are_identifiers(id in "[A-Za-z_][A-Za-z0-9_]{0,16}") {
		prop_assume!(!ident::RESERVED_WORDS.contains(&id.as_str()));
		prop_assert!(is_identifier(&id));
	}

	#[test]
	fn leading_digit_is_never_an_identifier(id in "[0-9][A-Za-z0-9_]{0,8}") {
		prop_assert!(!is_identifier(&id));
	}

	#[test]
	fn ints_survive_double_round_trip(v in -(1i64 << 52)..(1i64 << 52)) {
		let widened = Value::Int(v).coerce_to(ScalarKind::Double).unwrap();
		prop_assert_eq!(widened.coerce_to(ScalarKind::Int), Some(Value::Int(v)));
	}
}
