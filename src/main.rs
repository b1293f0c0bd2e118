use std::{env, fs::read_to_string, path::PathBuf, process::exit, rc::Rc, time::Instant};

use erb_frontend::{
    display_error,
    errors::errors::Error,
    loader::{
        loader::ScriptLoader,
        script::{LoadedFile, SourceFile},
    },
    registry::{config::Config, constants::ConstantTables},
};

const USAGE: &str = "usage: erb_frontend [--ignore-case] [--allow-overload] [--warn-overload] \
[--warn-duplicate] [--csv TABLE=FILE]... FILE...";

fn main() {
    let mut config = Config::new();
    let mut csv_files = vec![];
    let mut paths = vec![];

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ignore-case" => config = config.case_insensitive(true),
            "--allow-overload" => config = config.allow_overloading(true),
            "--warn-overload" => config = config.warn_on_overload(true),
            "--warn-duplicate" => config = config.warn_on_function_duplicate(true),
            "--csv" => match args.next().as_deref().and_then(|value| value.split_once('=')) {
                Some((table, path)) => csv_files.push((table.to_string(), PathBuf::from(path))),
                None => fail(),
            },
            _ if arg.starts_with("--") => fail(),
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        fail();
    }

    let start = Instant::now();

    let mut constants = ConstantTables::new();
    for (table, path) in &csv_files {
        let name = Rc::new(path.to_string_lossy().to_string());
        let text = read_file(path);
        if let Err(error) = constants.load_csv(table, &text, name) {
            let line = text.lines().nth((error.get_position().line as usize).saturating_sub(1));
            display_error(&error, line);
            exit(1);
        }
    }

    let files: Vec<SourceFile> = paths
        .iter()
        .map(|path| SourceFile::new(path.to_string_lossy(), read_file(path)))
        .collect();

    let mut loader = ScriptLoader::new(config, constants);
    let loaded = match loader.load_batch(&files) {
        Ok(loaded) => loaded,
        Err(error) => {
            display_error(&error, line_of(&files, &error));
            exit(2);
        }
    };

    let failed = report(&files, &loaded);
    println!("Loaded {} files ({} failed) in {:?}", loaded.len(), failed, start.elapsed());

    if failed > 0 {
        exit(1);
    }
}

/// Prints diagnostics and errors, returning the number of failed files.
fn report(files: &[SourceFile], loaded: &[LoadedFile]) -> usize {
    let mut failed = 0;
    for file in loaded {
        for diagnostic in &file.diagnostics {
            println!("{}", diagnostic);
        }
        match &file.result {
            Ok(script) => {
                let statements: usize = script.labels.iter().map(|label| label.statements.len()).sum();
                println!("{}: {} labels, {} statements", file.name, script.labels.len(), statements);
            }
            Err(error) => {
                failed += 1;
                display_error(error, line_of(files, error));
            }
        }
    }
    failed
}

fn line_of<'f>(files: &'f [SourceFile], error: &Error) -> Option<&'f str> {
    let position = error.get_position();
    files
        .iter()
        .find(|file| file.name == *position.file)
        .and_then(|file| file.line(position.line))
}

fn read_file(path: &PathBuf) -> String {
    read_to_string(path).unwrap_or_else(|error| {
        eprintln!("Failed to read {}: {}", path.display(), error);
        exit(1);
    })
}

fn fail() -> ! {
    eprintln!("{}", USAGE);
    exit(64);
}
