//! Fwrecover command line interface: the recovery stage on a simulated board.

use std::{path::Path, process};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
};
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use log::{debug, trace, LevelFilter};
use simplelog::*;

use fwrecover::host::{self, ButtonInput, HostBoard};
use fwrecover::{self as fr, hooks, BootDecision, RegionRole};

fn main() {
    println!("[FR] fwrecover v{}", crate_version!());

    ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        process::exit(0);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let role_names: Vec<&str> = RegionRole::ALL.iter().map(|role| role.name()).collect();

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Fwrecover runs the factory firmware recovery stage of the \
            bootloader against a simulated board. The flash partitions of the \
            board are files in the flash directory, one per region \
            (`s0.bin`, `s0_ext.bin`, ...), and the boot-mode register is \
            `bootmode.bin`.\n\
            \n\
            At start, the button decides what happens: \n\
               \t* not pressed: the boot continues normally \n\
               \t* pressed and released before the threshold: the firmware \
                   loader is selected \n\
               \t* held for the whole threshold: the factory images are \
                   restored from external flash and the board resets \n\
            \n\
            When anything goes wrong, the red LED blinks a fault code until \
            the button is released then pressed again.\n\
            \n\
            The process exits with code 3 when the board resets.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("FLASH_DIR")
                .help("directory holding the region files")
                .short("-d")
                .long("--flash-dir")
                .takes_value(true)
                .default_value("flash")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("INIT")
                .help("create a demo partition layout in the flash directory")
                .long_help(
                    "create a demo partition layout in the flash directory; \
                     the backups in external flash get valid factory images \
                     and the internal partitions get garbage.",
                )
                .long("--init"),
        )
        .arg(
            Arg::with_name("FORCE")
                .help("overwrite existing region files without asking")
                .short("-f")
                .long("--force")
                .requires("INIT"),
        )
        .arg(
            Arg::with_name("CORRUPT")
                .help("damage the image descriptor of a region before booting")
                .long("--corrupt")
                .takes_value(true)
                .possible_values(&role_names)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("HOLD")
                .help("hold the button for MS milliseconds at power-on")
                .long("--hold")
                .value_name("MS")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("INTERACTIVE")
                .help("drive the button with the space bar")
                .long_help(
                    "drive the button with the space bar; each press \
                     toggles the button. `Esc` or `Ctrl+C` exits.",
                )
                .short("-i")
                .long("--interactive")
                .conflicts_with("HOLD"),
        )
        .arg(
            Arg::with_name("THRESHOLD")
                .help("how long the button must be held to start the recovery")
                .long("--threshold")
                .value_name("MS")
                .takes_value(true)
                .default_value("10000")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("FAULT")
                .help("simulate a fatal fault instead of booting")
                .long("--fault")
                .takes_value(true)
                .possible_values(&["halt", "assert"])
                .require_equals(true),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'fwrecover -v -v -v' or 'fwrecover -vvv' vs 'fwrecover -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let flash_dir = Path::new(matches.value_of("FLASH_DIR").unwrap()).to_path_buf();
    let threshold = numeric_arg(&matches, "THRESHOLD", "threshold");

    // END - Arguments with default values =====================================

    let settings = fr::SettingsBuilder::default()
        .recovery_hold_ms(threshold)
        .finalize();

    // START - Arguments with NO default values ================================

    if matches.is_present("INIT") {
        let existing = host::existing_files(&flash_dir);
        if !existing.is_empty() && !matches.is_present("FORCE") && !confirm_overwrite(&flash_dir)
        {
            println!("[FR] ❌ Nothing was changed");
            process::exit(0);
        }
        host::init_layout(&flash_dir).unwrap_or_else(|e| {
            fail(&format!("cannot create the layout in `{}`: {}", flash_dir.display(), e))
        });
        println!(
            "[FR] 👍 Demo layout created in {}",
            style(flash_dir.display()).green()
        );
    }

    if let Some(name) = matches.value_of("CORRUPT") {
        // Checked by clap against the list of role names.
        let role: RegionRole = name.parse().unwrap();
        host::corrupt_descriptor(&flash_dir, role).unwrap_or_else(|e| {
            fail(&format!("cannot corrupt `{}`: {}", role, e))
        });
        println!("[FR] 💥 Descriptor of {} damaged", style(role).cyan());
    }

    let input = if matches.is_present("INTERACTIVE") {
        ButtonInput::Keyboard
    } else if matches.is_present("HOLD") {
        ButtonInput::HeldFor {
            ms: numeric_arg(&matches, "HOLD", "hold"),
        }
    } else {
        ButtonInput::Released
    };

    // END - Arguments =========================================================

    if host::existing_files(&flash_dir).is_empty() {
        fail(&format!(
            "no region files in `{}`, create them with `{}`",
            flash_dir.display(),
            style("--init").cyan()
        ));
    }

    let mut board = HostBoard::new(&flash_dir, input)
        .unwrap_or_else(|e| fail(&format!("cannot set up the terminal: {}", e)));

    // Run the boot stage ======================================================

    match matches.value_of("FAULT") {
        Some("halt") => hooks::on_system_halt(&mut board, &settings, 0),
        Some("assert") => hooks::on_assertion_failure(&mut board, &settings, file!(), line!()),
        _ => {}
    }

    let decision = hooks::contain_panics(&mut board, &settings, |board| {
        fr::run_boot_stage(board, &settings)
    });
    drop(board);
    debug!("boot decision: {:?}", decision);
    match decision {
        BootDecision::LoaderMode => println!("[FR] ⏩ Continue boot in firmware loader mode"),
        _ => println!("[FR] ⏩ Continue normal boot"),
    }
}

fn numeric_arg(matches: &clap::ArgMatches, name: &str, flag: &str) -> u32 {
    value_t!(matches.value_of(name), u32).unwrap_or_else(|_| {
        println!(
            "{}: `{}` needs to be a numeric value",
            style("error").red(),
            style(flag).cyan()
        );
        println!(
            "   {} `{}` is not a valid value",
            style("-->").cyan(),
            style(matches.value_of(name).unwrap_or_default()).on_red()
        );
        process::exit(-1);
    })
}

fn confirm_overwrite(dir: &Path) -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Region files already exist in `{}`, overwrite them?",
            dir.display()
        ))
        .default(false)
        .interact_on(&Term::stderr())
        .unwrap_or(false)
}

fn fail(message: &str) -> ! {
    println!("{}: {}", style("error").red(), message);
    process::exit(-1);
}
