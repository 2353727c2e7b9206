use astmatch::{compile, parse_stmt, Node, Pattern};

pub fn stmt(code: &str) -> Node {
    match parse_stmt(code) {
        Ok(node) => node,
        Err(e) => panic!("code {:?} should parse: {}", code, e),
    }
}

pub fn pattern(text: &str) -> Pattern {
    match compile(text) {
        Ok(pattern) => pattern,
        Err(e) => panic!("pattern {:?} should compile: {}", text, e),
    }
}
