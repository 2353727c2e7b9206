use std::{
    env, io,
    path::{Path, PathBuf},
};

use astmatch::SyntaxError;
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use path_clean::PathClean;

/// Renders a syntax error against its source with codespan.
pub fn report_syntax_error(name: &str, source: &str, err: &SyntaxError) {
    let mut files = SimpleFiles::new();
    let file = files.add(name, source);
    let diagnostic = Diagnostic::error().with_labels(vec![Label::primary(
        file,
        err.location.clone(),
    )
    .with_message(format!("{}", err))]);

    let writer = StandardStream::stderr(ColorChoice::Always);
    let config = term::Config::default();

    term::emit(&mut writer.lock(), &config, &files, &diagnostic)
        .expect("unable to generate codespan diagnostic");
}

pub fn absolute_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();

    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    }
    .clean();

    Ok(absolute_path)
}
