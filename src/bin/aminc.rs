use aminc::err::ManifestError;
use aminc::{FieldMatch, ManifestParser, ParserSettings, PatchOutcome, VERSION_CODE};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::Level;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

struct Aminc {
    input: Option<PathBuf>,
    increment: i32,
    parser_settings: ParserSettings,
    output_format: OutputFormat,
    verbosity_level: Option<Level>,
}

const USAGE: &str = "\
Compiled AndroidManifest.xml versionCode modifier

Usage: aminc file [increment]
   file - file name of compiled (binary) AndroidManifest.xml
   increment - integer value to increment versionCode by
";

impl Aminc {
    pub fn from_cli_matches(matches: &ArgMatches) -> Self {
        let input = matches.get_one::<String>("INPUT").map(PathBuf::from);
        let increment = matches.get_one::<i32>("INCREMENT").copied().unwrap_or(0);

        let field = matches
            .get_one::<String>("field")
            .map(String::as_str)
            .unwrap_or(VERSION_CODE);

        let output_format = match matches.get_one::<String>("output-format").map(String::as_str) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            3 => Some(Level::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(Level::Trace)
            }
        };

        Aminc {
            input,
            increment,
            parser_settings: ParserSettings::new().field_name(field),
            output_format,
            verbosity_level,
        }
    }

    /// Main entry point for `Aminc`, returns the process exit code.
    pub fn run(&self) -> i32 {
        self.try_to_initialize_logging();

        let Some(input) = &self.input else {
            eprint!("{}", USAGE);
            return 1;
        };

        let mut parser = match self.open(input) {
            Ok(parser) => parser,
            Err(e) => {
                eprintln!("{:#}", e);
                return 1;
            }
        };

        let field = match parser.find_field() {
            // A value of 0 is indistinguishable from a missing field for callers of this tool.
            Ok(Some(field)) if field.value != 0 => field,
            Ok(_) => {
                self.report_not_found(input);
                return 0;
            }
            Err(e) => {
                eprintln!("{}: {}", input.display(), e);
                return 0;
            }
        };

        let patch = if self.increment != 0 {
            Some(parser.apply_increment(&field, self.increment))
        } else {
            None
        };

        match self.output_format {
            OutputFormat::Text => self.report_text(input, &field, patch),
            OutputFormat::Json => self.report_json(input, &field, patch),
        }

        0
    }

    fn open(&self, input: &Path) -> Result<ManifestParser<File>> {
        let opened = if self.increment != 0 {
            ManifestParser::from_path_for_update(input)
        } else {
            ManifestParser::from_path(input)
        };
        let parser =
            opened.with_context(|| format!("Could not open file: {}", input.display()))?;

        Ok(parser.with_configuration(self.parser_settings.clone()))
    }

    fn report_not_found(&self, input: &Path) {
        let field = self.parser_settings.get_field_name();
        match self.output_format {
            OutputFormat::Text => println!("{} not found in {}", field, input.display()),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "file": input, "field": null, "patch": null })
            ),
        }
    }

    fn report_text(
        &self,
        input: &Path,
        field: &FieldMatch,
        patch: Option<aminc::err::Result<PatchOutcome>>,
    ) {
        println!("Found in {}:", input.display());
        println!(
            "{} {} (0x{:X}) at offset {} (0x{:X})",
            field.name, field.value, field.value, field.offset, field.offset
        );

        let Some(patch) = patch else {
            return;
        };

        println!("Incrementing {} by {}...", field.name, self.increment);
        match patch {
            Ok(outcome) => println!(
                "Success, the new value read from the manifest file is {} (0x{:X})",
                outcome.verified, outcome.verified
            ),
            Err(ManifestError::VerificationMismatch {
                found: Some(found), ..
            }) => println!(
                "Error, the new value read from the manifest file is {} (0x{:X})",
                found, found
            ),
            Err(e) => println!("Error, {}", e),
        }
    }

    fn report_json(
        &self,
        input: &Path,
        field: &FieldMatch,
        patch: Option<aminc::err::Result<PatchOutcome>>,
    ) {
        let patch = match patch {
            None => serde_json::Value::Null,
            Some(Ok(outcome)) => serde_json::json!(outcome),
            Some(Err(e)) => serde_json::json!({ "error": e.to_string() }),
        };

        println!(
            "{}",
            serde_json::json!({ "file": input, "field": field, "patch": patch })
        );
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level.to_level_filter(),
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {:?}", e);
            }
        }
    }
}

fn command() -> Command {
    Command::new("aminc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Finds (and optionally increments) versionCode in a compiled AndroidManifest.xml")
        .arg(
            Arg::new("INPUT")
                .value_name("FILE")
                .help("File name of compiled (binary) AndroidManifest.xml"),
        )
        .arg(
            Arg::new("INCREMENT")
                .value_name("INCREMENT")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i32))
                .help("Integer value to increment the field by. 0 (the default) only inspects the file."),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .short('f')
                .value_name("NAME")
                .default_value(VERSION_CODE)
                .help("Name of the attribute to look for"),
        )
        .arg(
            Arg::new("output-format")
                .long("format")
                .short('o')
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Sets the output format"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace"),
        )
}

fn main() {
    let matches = command().get_matches();

    let app = Aminc::from_cli_matches(&matches);
    exit(app.run());
}
