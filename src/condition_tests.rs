use super::*;

fn binding(pairs: &[(&str, Literal)]) -> Binding {
    Binding {
        entries: pairs.iter().map(|(n, l)| ((*n).to_string(), l.clone())).collect(),
    }
}

#[test]
fn parses_simple_equality() {
    let cond = parse_condition("OS==\"linux\"").unwrap();
    assert_eq!(cond, Condition::Eq("OS".to_string(), Literal::Str("linux".to_string())));
}

#[test]
fn parses_and_or_not_with_precedence() {
    let cond = parse_condition("OS==\"linux\" or OS==\"mac\" and not chromeos==1").unwrap();
    let b_linux = binding(&[("OS", Literal::Str("linux".to_string())), ("chromeos", Literal::Int(0))]);
    let b_mac_chromeos = binding(&[("OS", Literal::Str("mac".to_string())), ("chromeos", Literal::Int(1))]);
    assert!(cond.eval(&b_linux));
    assert!(!cond.eval(&b_mac_chromeos));
}

#[test]
fn parens_override_precedence() {
    let cond = parse_condition("(OS==\"linux\" or OS==\"mac\") and chromeos==1").unwrap();
    let b = binding(&[("OS", Literal::Str("mac".to_string())), ("chromeos", Literal::Int(1))]);
    assert!(cond.eval(&b));
}

#[test]
fn referenced_axes_collects_all_names() {
    let cond = parse_condition("OS==\"linux\" and chromeos==1").unwrap();
    let axes: Vec<_> = cond.referenced_axes().into_iter().collect();
    assert_eq!(axes, vec!["OS".to_string(), "chromeos".to_string()]);
}

#[test]
fn domain_of_collects_rhs_literals_for_one_axis() {
    let cond = parse_condition("OS==\"linux\" or OS==\"mac\" or chromeos==1").unwrap();
    let domain = cond.domain_of("OS");
    assert_eq!(
        domain,
        [Literal::Str("linux".to_string()), Literal::Str("mac".to_string())]
            .into_iter()
            .collect()
    );
}

#[test]
fn integer_literal_rhs_parses() {
    let cond = parse_condition("chromeos==1").unwrap();
    let b = binding(&[("chromeos", Literal::Int(1))]);
    assert!(cond.eval(&b));
}

#[test]
fn trailing_tokens_are_rejected() {
    assert!(parse_condition("OS==\"linux\" extra").is_err());
}

#[test]
fn bare_true_and_false_literals_parse() {
    assert_eq!(parse_condition("True").unwrap(), Condition::True);
    assert_eq!(parse_condition("False").unwrap(), Condition::False);
    assert!(Condition::True.eval(&Binding::default()));
    assert!(!Condition::False.eval(&Binding::default()));
}
