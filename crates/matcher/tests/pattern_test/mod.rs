use super::common::{pattern, stmt};
use astmatch::{compile, parse_stmt, SyntaxErrorKind};
use insta::assert_snapshot;

#[test]
fn compile_is_a_pure_function_of_its_input() {
    for text in ["self.method", "$call{self.$method()}.$attr", "x = y", "f(~*)"] {
        assert_eq!(compile(text).unwrap(), compile(text).unwrap(), "{}", text);
    }
}

#[test]
fn malformed_patterns_carry_positions() {
    let err = compile("a.$").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::InvalidCaptureKey);
    assert_eq!(err.location.start.column, 3);

    let err = compile("f(a,,)").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);
    assert_eq!(err.location.start.line, 1);

    let err = compile("").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::EmptyInput);
}

#[test]
fn patterns_and_targets_print_canonically() {
    assert_snapshot!(
        parse_stmt("self.method( arg ,k = 1)[0: 2]").unwrap().to_string(),
        @"self.method(arg, k=1)[0:2]"
    );
    assert_snapshot!(
        pattern("$call{self.$method(~*)}.$attr").to_string(),
        @"$call{self.$method(~*)}.$attr"
    );
}

#[test]
fn two_statements_are_rejected() {
    let err = compile("a.b\nc.d").unwrap_err();
    // the second statement begins on line 2
    assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);
    assert_eq!(err.location.start.line, 2);

    assert!(parse_stmt("a.b\nc.d").is_err());
}

#[test]
fn patterns_survive_reuse_after_match() {
    let p = pattern("$obj.method");
    for code in ["a.method", "a.b.method", "a[0].method", "None.method"] {
        let target = stmt(code);
        assert!(p.match_node(&target).unwrap().is_some(), "{}", code);
    }
    for code in ["obj.method()", "obj.other"] {
        let target = stmt(code);
        assert!(p.match_node(&target).unwrap().is_none(), "{}", code);
    }
}
