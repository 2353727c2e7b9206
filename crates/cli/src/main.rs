use anyhow::{bail, Result};
use astmatch::{compile, compile_expr, parse_module, MatchResult};
use astmatch_cli::{absolute_path, report_syntax_error};
use clap::Parser;
use serde::Serialize;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};

/// A simple CLI app for quick debugging of patterns against parsed source.
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// The pattern to search for.
    pattern: String,

    /// The file to search. Stdin will be read if no file is provided.
    input_file_name: Option<String>,

    /// Compile the pattern as a bare expression instead of a statement.
    #[arg(long)]
    expr: bool,

    /// Dump the parsed module before matching.
    #[arg(long)]
    dump_ast: bool,

    /// Explain statements that do not match at their root.
    #[arg(long)]
    trace: bool,
}

#[derive(Serialize)]
struct MatchDump {
    stmt: usize,
    line: usize,
    column: usize,
    source: String,
    groups: Vec<String>,
    kw_groups: BTreeMap<String, String>,
}

impl MatchDump {
    fn new(stmt: usize, result: &MatchResult) -> Self {
        let location = result.node.location();
        Self {
            stmt,
            line: location.start.line,
            column: location.start.column,
            source: result.node.to_string(),
            groups: result.groups.iter().map(|b| b.to_string()).collect(),
            kw_groups: result
                .kw_groups
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let (name, source) = if let Some(file_name) = opts.input_file_name {
        let ab_path = absolute_path(file_name.clone())?;
        (file_name, fs::read_to_string(ab_path)?)
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        ("<stdin>".to_owned(), s)
    };

    let compile_fn = if opts.expr { compile_expr } else { compile };
    let pattern = match compile_fn(&opts.pattern) {
        Ok(pattern) => pattern,
        Err(err) => {
            report_syntax_error("<pattern>", &opts.pattern, &err);
            bail!("pattern does not compile");
        }
    };

    let stmts = match parse_module(&source) {
        Ok(stmts) => stmts,
        Err(err) => {
            report_syntax_error(&name, &source, &err);
            bail!("source does not parse");
        }
    };

    if opts.dump_ast {
        println!(r#"=============== AST =============="#);
        serde_yaml::to_writer(io::stdout().lock(), &stmts)?;
        println!(r#"=========== End of AST ==========="#);
    }

    let mut dumps = vec![];
    for (index, stmt) in stmts.iter().enumerate() {
        for result in pattern.find_all(stmt)? {
            dumps.push(MatchDump::new(index, &result));
        }
        if opts.trace {
            if let Err(err) = pattern.assert_match(stmt) {
                eprintln!("statement {}: {}", index, err);
            }
        }
    }
    serde_yaml::to_writer(io::stdout().lock(), &dumps)?;
    Ok(())
}
