use clap::Parser;
use sav_converter::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(_stats) => {
            // Success - results have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("SAV Converter - SPSS Data File to CSV Converter");
    println!("===============================================");
    println!();
    println!("Convert SPSS system files (.sav) into plain CSV files, resolving");
    println!("ambiguous legacy text encodings with a fallback strategy chain.");
    println!();
    println!("USAGE:");
    println!("    sav-converter <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    convert     Convert a single SAV file to CSV");
    println!("    batch       Convert every SAV file under a directory of subfolders");
    println!("    inspect     Inspect SAV files without converting anything");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Convert one file (output lands next to the source):");
    println!("    sav-converter convert survey.sav");
    println!();
    println!("    # Convert a survey archive; outputs are named after each subfolder:");
    println!("    sav-converter batch data/raw_data --output data/csv_output");
    println!();
    println!("    # Check what a directory of files looks like first:");
    println!("    sav-converter inspect data/raw_data --output-format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    sav-converter <COMMAND> --help");
}
