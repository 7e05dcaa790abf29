use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::{LevelFilter, warn};
use serde::Serialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use appinfo::keyvalues::writer;
use appinfo::{
    AppInfoParser, GenreLookup, InstallLayout, KvNode, LibraryFolders, NoGenreLookup,
    ParserSettings, SteamDir,
};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Duration;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppInfoOutputFormat {
    Json,
    JsonL,
    Vdf,
}

struct AppInfoDump {
    parser_settings: ParserSettings,
    appinfo: PathBuf,
    library_folders: Option<PathBuf>,
    layout: InstallLayout,
    output_format: AppInfoOutputFormat,
    output: Box<dyn Write>,
    all_apps: bool,
    resolve_genres: bool,
    genre_timeout: Duration,
    verbosity_level: Option<LevelFilter>,
}

impl AppInfoDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let steam_dir = match matches.get_one::<String>("INPUT") {
            Some(root) => Some(SteamDir::new(root)),
            None => SteamDir::detect(),
        };

        let appinfo = match (matches.get_one::<String>("appinfo"), &steam_dir) {
            (Some(path), _) => PathBuf::from(path),
            (None, Some(steam_dir)) => steam_dir.appinfo_path(),
            (None, None) => bail!(
                "Could not find a Steam installation, pass its root or `--appinfo` explicitly"
            ),
        };

        let library_folders = matches
            .get_one::<String>("libraryfolders")
            .map(PathBuf::from)
            .or_else(|| steam_dir.as_ref().map(SteamDir::library_folders_path));

        let layout = match matches.get_one::<String>("layout").map(String::as_str) {
            Some("flat") => InstallLayout::Flat,
            _ => InstallLayout::Steam,
        };

        let output_format = match matches
            .get_one::<String>("output-format")
            .map(String::as_str)
            .unwrap_or("json")
        {
            "jsonl" => AppInfoOutputFormat::JsonL,
            "vdf" => AppInfoOutputFormat::Vdf,
            _ => AppInfoOutputFormat::Json,
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            3 => Some(LevelFilter::Trace),
            _ => {
                eprintln!("using more than -vvv does not affect verbosity level");
                Some(LevelFilter::Trace)
            }
        };

        let output: Box<dyn Write> = match matches.get_one::<String>("output-target") {
            Some(path) => {
                let f = Self::create_output_file(path, !matches.get_flag("no-confirm-overwrite"))
                    .with_context(|| {
                        format!("An error occurred while creating output file at `{}`", path)
                    })?;
                Box::new(BufWriter::new(f))
            }
            None => Box::new(BufWriter::new(io::stdout())),
        };

        let genre_timeout = *matches
            .get_one::<u64>("genre-timeout")
            .expect("has default");

        Ok(AppInfoDump {
            parser_settings: ParserSettings::new()
                .validate_framing(!matches.get_flag("keep-misframed")),
            appinfo,
            library_folders,
            layout,
            output_format,
            output,
            all_apps: matches.get_flag("apps"),
            resolve_genres: !matches.get_flag("no-genres"),
            genre_timeout: Duration::from_secs(genre_timeout),
            verbosity_level,
        })
    }

    /// Main entry point for `AppInfoDump`
    pub fn run(&mut self) -> Result<()> {
        self.try_to_initialize_logging();

        let libraries = self.load_library_folders();

        let mut parser = AppInfoParser::from_path(&self.appinfo)
            .with_context(|| format!("Failed to open {}", self.appinfo.display()))?
            .with_configuration(self.parser_settings.clone());

        if self.all_apps {
            for app in parser.apps(&libraries) {
                match app {
                    Ok(app) => self.dump(&app, &app.data)?,
                    Err(e) => eprintln!("{}", e),
                }
            }
        } else {
            let genres = self.genre_lookup();
            for soundtrack in parser.soundtracks(&libraries, genres.as_ref()) {
                match soundtrack {
                    Ok(soundtrack) => self.dump(&soundtrack, &soundtrack.data)?,
                    Err(e) => eprintln!("{}", e),
                }
            }
        }

        self.output.flush()?;
        Ok(())
    }

    fn load_library_folders(&self) -> LibraryFolders {
        let Some(path) = &self.library_folders else {
            return LibraryFolders::default();
        };

        match LibraryFolders::from_path(path) {
            Ok(libraries) => libraries.with_layout(self.layout),
            Err(e) => {
                warn!("Install dirs will not be resolved: {}", e);
                LibraryFolders::default()
            }
        }
    }

    fn genre_lookup(&self) -> Box<dyn GenreLookup> {
        #[cfg(feature = "store")]
        {
            if self.resolve_genres {
                return Box::new(appinfo::StoreClient::new().timeout(self.genre_timeout));
            }
        }

        Box::new(NoGenreLookup)
    }

    fn dump<T: Serialize>(&mut self, item: &T, data: &KvNode) -> Result<()> {
        match self.output_format {
            AppInfoOutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.output, item)?;
                writeln!(self.output)?;
            }
            AppInfoOutputFormat::JsonL => {
                serde_json::to_writer(&mut self.output, item)?;
                writeln!(self.output)?;
            }
            AppInfoOutputFormat::Vdf => {
                write!(self.output, "{}", writer::to_text(data))?;
            }
        }

        Ok(())
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!(
                "There is a directory at {}, refusing to overwrite",
                p.display()
            );
        }

        if p.exists() && prompt {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Are you sure you want to override output file at {}",
                    p.display()
                ))
                .default(false)
                .interact()
                .map_err(|e| {
                    format_err!("Failed to write confirmation prompt to term caused by\n{}", e)
                })?;

            if !confirmed {
                bail!("Cancelled");
            }
        }

        // Ok to assume p is not an existing directory
        match p.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                fs::create_dir_all(parent)?;
            }
            Some(_) => {}
            None => bail!("Output file cannot be root."),
        }

        Ok(File::create(p)?)
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {}", e);
            }
        }
    }
}

fn command() -> Command {
    Command::new("appinfo_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to dump the soundtracks (or all apps) of Steam's appinfo.vdf")
        .arg(
            Arg::new("INPUT")
                .value_name("STEAM_ROOT")
                .help("Steam installation root, detected from well known locations when omitted."),
        )
        .arg(
            Arg::new("appinfo")
                .long("appinfo")
                .value_name("PATH")
                .help("Path to `appinfo.vdf`, overrides the one below the Steam root."),
        )
        .arg(
            Arg::new("libraryfolders")
                .long("libraryfolders")
                .value_name("PATH")
                .help("Path to `libraryfolders.vdf`, overrides the one below the Steam root."),
        )
        .arg(
            Arg::new("layout")
                .long("layout")
                .value_parser(["steam", "flat"])
                .default_value("steam")
                .help("How install dirs are laid out below each library root.")
                .long_help(indoc!(r#"
                    How install dirs are laid out below each library root:
                        "steam" - <library>/steamapps/{music|common}/<installdir>
                        "flat"  - <library>/{music|common}/<installdir>
                "#)),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["json", "jsonl", "vdf"])
                .default_value("json")
                .help("Sets the output format")
                .long_help(indoc!(r#"
                    Sets the output format:
                        "json"  - pretty printed JSON, one document per app.
                        "jsonl" - one JSON document per line.
                        "vdf"   - the raw key-values of every app, as text.
                "#)),
        )
        .arg(
            Arg::new("apps")
                .long("apps")
                .action(ArgAction::SetTrue)
                .help("Dump every app instead of only the soundtracks."),
        )
        .arg(
            Arg::new("no-genres")
                .long("no-genres")
                .action(ArgAction::SetTrue)
                .help("Do not query the store for genre names."),
        )
        .arg(
            Arg::new("genre-timeout")
                .long("genre-timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("10")
                .help("Timeout for every genre lookup."),
        )
        .arg(
            Arg::new("keep-misframed")
                .long("keep-misframed")
                .action(ArgAction::SetTrue)
                .help("Also dump apps whose data does not end where their declared size says it should."),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("PATH")
                .help(indoc!("
                    Writes output to the file specified instead of stdout, errors will still be printed to stderr.
                    Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`.
                    Will create parent directories if needed.")),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help(indoc!("
                    -v - info, -vv - debug, -vvv - trace.
                    trace output is only available in debug builds, as it is extremely verbose")),
        )
}

fn main() {
    let matches = command().get_matches();

    let result = AppInfoDump::from_cli_matches(&matches).and_then(|mut app| app.run());

    if let Err(e) = result {
        eprintln!("{:?}", e);
        exit(1);
    }
}
