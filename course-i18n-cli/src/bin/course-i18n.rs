use clap::{Arg, ArgAction, ArgMatches, Command};
use course_i18n::{BundleKey, JsonFileStore, Viewer};
use course_i18n_cli::{export, import, load_config, load_content, progress, render};
use std::fs;
use std::path::Path;

fn common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("content")
                .long("content")
                .short('c')
                .help("JSON file listing the content items")
                .required(true),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .short('s')
                .help("JSON file holding stored translations")
                .default_value("translations.json"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Engine configuration file (JSON)"),
        )
}

fn string_arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse()?),
        )
        .init();

    let matches = Command::new("course-i18n")
        .version("0.1.0")
        .about("Export, import and preview course translations")
        .subcommand_required(true)
        .subcommand(
            common_args(Command::new("export").about("Write gettext catalogs to a zip archive"))
                .arg(
                    Arg::new("locale")
                        .long("locale")
                        .short('l')
                        .help("Target locale; may be repeated")
                        .required(true)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Archive to write")
                        .default_value("translations.zip"),
                )
                .arg(
                    Arg::new("pseudo")
                        .long("pseudo")
                        .help("Fill every translation with the pseudo-language")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            common_args(Command::new("import").about("Apply a zip archive or a single catalog"))
                .arg(
                    Arg::new("file")
                        .help("Archive (.zip) or catalog file to import")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            common_args(Command::new("render").about("Show the translated fields of one item"))
                .arg(
                    Arg::new("key")
                        .help("Bundle key, e.g. unit:12:fr")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("author")
                        .long("author")
                        .help("Render as an author, with degradation notices")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            common_args(Command::new("progress").about("Show translation progress per item"))
                .arg(
                    Arg::new("locale")
                        .long("locale")
                        .short('l')
                        .help("Locale to report on")
                        .required(true),
                ),
        )
        .get_matches();

    let Some((name, sub)) = matches.subcommand() else {
        return Err("no command given".into());
    };

    let items = load_content(Path::new(string_arg(sub, "content")))?;
    let mut store = JsonFileStore::open(Path::new(string_arg(sub, "store")))?;
    let config = load_config(sub.get_one::<String>("config").map(Path::new))?;

    match name {
        "export" => {
            let locales: Vec<String> = sub
                .get_many::<String>("locale")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let archive = export(&items, &store, &config, &locales, sub.get_flag("pseudo"))?;
            let output = string_arg(sub, "output");
            fs::write(output, archive)?;
            println!("Wrote {}", output);
        }
        "import" => {
            let report = import(&items, &mut store, &config, Path::new(string_arg(sub, "file")))?;
            println!(
                "Imported {} translations into {} bundles ({})",
                report.translations_applied, report.bundles_updated, report.locale
            );
            for key in &report.unknown_locations {
                println!("  skipped unknown content: {}", key);
            }
        }
        "render" => {
            let key: BundleKey = string_arg(sub, "key").parse()?;
            let viewer = if sub.get_flag("author") {
                Viewer::Author
            } else {
                Viewer::EndUser
            };
            for (field, document) in render(&items, &store, &config, &key, viewer)? {
                println!("== {} ==\n{}\n", field, document);
            }
        }
        "progress" => {
            for (resource, status) in progress(&items, &mut store, string_arg(sub, "locale"))? {
                println!("{:<32} {:?}", resource, status);
            }
        }
        other => return Err(format!("unknown command '{}'", other).into()),
    }

    Ok(())
}
