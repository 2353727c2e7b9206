use super::common::{pattern, stmt};
use astmatch::{
    compile_expr, match_pattern, parse_expr, MatchErrorKind, NodeKind, Pattern,
};

#[test]
fn exact_attribute_match_binds_nothing() {
    let result = pattern("self.method")
        .match_node(&stmt("self.method"))
        .unwrap()
        .expect("should match");
    assert!(result.groups.is_empty());
    assert!(result.kw_groups.is_empty());
}

#[test]
fn call_does_not_match_attribute_pattern() {
    let result = pattern("self.method")
        .match_node(&stmt("self.method()"))
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn named_capture_binds_the_receiver() {
    let target = stmt("a.b.method");
    let result = pattern("$obj.method")
        .match_node(&target)
        .unwrap()
        .expect("should match");
    assert!(result.groups.is_empty());
    let obj = result.kw_groups["obj"].as_node().unwrap();
    assert_eq!(obj.kind(), NodeKind::Attribute);
    assert_eq!(obj.to_string(), "a.b");
}

#[test]
fn capture_with_subscript_inner_pattern() {
    let target = stmt("lst[0]");
    let result = pattern("$sub{lst[~]}")
        .match_node(&target)
        .unwrap()
        .expect("should match");
    assert_eq!(result.kw_groups["sub"].to_string(), "lst[0]");
}

#[test]
fn annotated_assignment_is_a_different_kind() {
    let result = pattern("x: type = value").match_node(&stmt("x = value")).unwrap();
    assert!(result.is_none());
}

#[test]
fn positional_capture_forms_groups() {
    let target = stmt("b.a");
    let result = pattern("$0.a")
        .match_node(&target)
        .unwrap()
        .expect("should match");
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].to_string(), "b");
    assert!(result.kw_groups.is_empty());
}

#[test]
fn skipping_index_zero_is_a_bug_not_a_no_match() {
    let err = pattern("$1.a").match_node(&stmt("b.a")).unwrap_err();
    assert_eq!(err.kind, MatchErrorKind::CaptureIndexGap);
}

#[test]
fn list_arity_is_exact() {
    let two_args = pattern("f(x, y)");
    assert!(two_args.match_node(&stmt("f(x, y)")).unwrap().is_some());
    assert!(two_args.match_node(&stmt("f(x)")).unwrap().is_none());
    assert!(two_args.match_node(&stmt("f(x, y, z)")).unwrap().is_none());

    let any_args = pattern("f(~*)");
    for code in ["f()", "f(x)", "f(x, y, z)"] {
        assert!(any_args.match_node(&stmt(code)).unwrap().is_some(), "{}", code);
    }
}

#[test]
fn wrapper_symmetry_yields_identical_bindings() {
    let wrapped = stmt("a.b.method");
    let bare = parse_expr("a.b.method").unwrap();
    let stmt_pattern = pattern("$obj.method");
    let expr_pattern = compile_expr("$obj.method").unwrap();

    let mut dumps = vec![];
    for p in [&stmt_pattern, &expr_pattern] {
        for target in [&wrapped, &bare] {
            let result = p.match_node(target).unwrap().expect("should match");
            dumps.push(result.kw_groups["obj"].to_string());
        }
    }
    assert!(dumps.iter().all(|d| d == "a.b"), "{:?}", dumps);
}

#[test]
fn wildcard_matches_every_shape() {
    for code in ["abc", "1", "{0: None}", "(1,)", "x = y = z", "return"] {
        let target = stmt(code);
        let result = Pattern::wildcard().match_node(&target).unwrap();
        assert!(result.is_some(), "{}", code);
    }
}

#[test]
fn results_are_reproducible() {
    let p = pattern("$call{self.$method()}.$attr");
    let target = stmt("self.foo().bar");
    let a = p.match_node(&target).unwrap().unwrap();
    let b = p.match_node(&target).unwrap().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.node.location(), target.location());
}

#[test]
fn compiled_patterns_are_shareable_across_threads() {
    let p = pattern("$f(~*)");
    let sources = ["a(1)", "b(2, 3)", "c()"];
    let expected = ["a", "b", "c"];
    std::thread::scope(|scope| {
        for (source, name) in sources.iter().copied().zip(expected) {
            let p = &p;
            scope.spawn(move || {
                let target = stmt(source);
                let result = p.match_node(&target).unwrap().expect("should match");
                assert_eq!(result.kw_groups["f"].to_string(), name);
            });
        }
    });
}

#[test]
fn compile_and_match_composed() {
    let target = stmt("lst[i]");
    let result = match_pattern("$sub{~[index]}", &target).unwrap();
    assert!(result.is_none());
    let result = match_pattern("$sub{~[~]}", &target).unwrap().unwrap();
    assert_eq!(result.kw_groups["sub"].to_string(), "lst[i]");
}

#[test]
fn assertion_error_explains_the_mismatch() {
    let err = pattern("lst[0]").assert_match(&stmt("lst[1]")).unwrap_err();
    assert_eq!(err.kind, MatchErrorKind::AssertionFailed);
    let message = err.additional_message.expect("message carries the trace");
    assert!(message.contains("lst[1]"));
    assert!(message.contains("Trace:"));
}

#[test]
fn find_all_surfaces_nested_matches() {
    let p = compile_expr("$sub{~[~]}").unwrap();
    let target = stmt("a[b[0]] = c[1]");
    let found: Vec<_> = p
        .find_all(&target)
        .unwrap()
        .iter()
        .map(|res| res.kw_groups["sub"].to_string())
        .collect();
    assert_eq!(found, ["a[b[0]]", "b[0]", "c[1]"]);
}
