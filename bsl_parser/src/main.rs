use bsl_parser::config::RuntimeConfig;
use bsl_parser::{batch, logging, pipeline};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Json,
    Summary,
}

#[derive(Debug)]
struct CliOptions {
    output: OutputMode,
    config_file: Option<PathBuf>,
    batch: batch::BatchConfig,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("bsl_parser");

    if args.len() < 2 {
        eprintln!("Usage: {} <module.bsl|directory> [options]", program);
        eprintln!("       {} --help", program);
        return ExitCode::FAILURE;
    }

    if args[1] == "--help" {
        print_help(program);
        return ExitCode::SUCCESS;
    }

    let mut options = parse_options(&args[2..]);

    if let Some(path) = &options.config_file {
        match RuntimeConfig::from_file(path) {
            Ok(runtime) => options.batch.runtime = runtime,
            Err(error) => {
                eprintln!("Error: {}", error);
                return ExitCode::FAILURE;
            }
        }
    }

    if let Err(error) =
        logging::init_global_logging_with_preferences(options.batch.runtime.logging.clone())
    {
        eprintln!("Error: failed to initialize logging: {}", error);
        return ExitCode::FAILURE;
    }

    if let Err(error) = pipeline::validate_pipeline() {
        eprintln!("Error: pipeline validation failed: {}", error);
        return ExitCode::FAILURE;
    }

    let input_path = Path::new(&args[1]);

    let succeeded = if input_path.is_file() {
        process_single_file(input_path, &options)
    } else if input_path.is_dir() {
        process_directory_batch(input_path, &options.batch)
    } else {
        eprintln!("Error: Input must be a module file (.bsl, .os) or a directory");
        eprintln!("  Path: {}", input_path.display());
        false
    };

    print_collected_errors();

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_help(program_name: &str) {
    println!("BSL Parser v{}", env!("CARGO_PKG_VERSION"));
    println!("Tokenizer and AST builder for 1C:Enterprise and OneScript modules");
    println!();
    println!("USAGE:");
    println!("    {} <module.bsl>                 # Print the module AST as JSON", program_name);
    println!("    {} <directory> [options]        # Parse every module in a directory", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help              Show this help message");
    println!("    --json              Print the AST as pretty JSON (default for a single file)");
    println!("    --summary           Print counts instead of the AST");
    println!("    --sequential        Process files one at a time");
    println!("    --threads N         Maximum worker threads (default: auto)");
    println!("    --no-recursive      Don't search subdirectories");
    println!("    --max-files N       Limit the number of files processed");
    println!("    --fail-fast         Stop on the first failing file");
    println!("    --quiet             Suppress progress reporting");
    println!("    --config FILE       Load runtime preferences from a TOML file");
    println!();
    println!("EXAMPLES:");
    println!("    {} ОбщийМодуль.bsl", program_name);
    println!("    {} src/ --threads 4 --summary", program_name);
    println!("    {} src/ --sequential --fail-fast", program_name);
    println!();

    println!("PIPELINE:");
    for line in pipeline::get_pipeline_info().report().lines() {
        println!("    {}", line);
    }
}

fn parse_count(args: &[String], index: usize, option: &str) -> Option<usize> {
    match args.get(index + 1).map(|value| value.parse::<usize>()) {
        Some(Ok(count)) => Some(count),
        Some(Err(_)) => {
            eprintln!("Warning: Invalid value '{}' for {}, ignoring", args[index + 1], option);
            None
        }
        None => {
            eprintln!("Warning: {} requires a number", option);
            None
        }
    }
}

fn parse_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions {
        output: OutputMode::Json,
        config_file: None,
        batch: batch::BatchConfig {
            progress_reporting: true,
            ..Default::default()
        },
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => options.output = OutputMode::Json,
            "--summary" => options.output = OutputMode::Summary,
            "--sequential" => options.batch.max_threads = 1,
            "--threads" => {
                if let Some(threads) = parse_count(args, i, "--threads") {
                    options.batch.max_threads = threads.max(1);
                }
                i += 1;
            }
            "--no-recursive" => options.batch.recursive = false,
            "--max-files" => {
                if let Some(max_files) = parse_count(args, i, "--max-files") {
                    options.batch.max_files = Some(max_files);
                }
                i += 1;
            }
            "--fail-fast" => options.batch.fail_fast = true,
            "--quiet" => options.batch.progress_reporting = false,
            "--config" => {
                match args.get(i + 1) {
                    Some(path) => options.config_file = Some(PathBuf::from(path)),
                    None => eprintln!("Warning: --config requires a file path"),
                }
                i += 1;
            }
            other => eprintln!("Warning: Unknown option '{}'", other),
        }
        i += 1;
    }

    options
}

fn process_single_file(file_path: &Path, options: &CliOptions) -> bool {
    match pipeline::process_file_with_config(file_path, 0, &options.batch.runtime) {
        Ok(result) => {
            match options.output {
                OutputMode::Json => match pipeline::PipelineOutput::new(&result).to_json_pretty() {
                    Ok(json) => println!("{}", json),
                    Err(error) => {
                        eprintln!("Error: failed to serialize AST: {}", error);
                        return false;
                    }
                },
                OutputMode::Summary => print_file_summary(&result),
            }
            true
        }
        Err(error) => {
            eprintln!("FAILED [{}] {}", error.error_code(), error);
            false
        }
    }
}

fn print_file_summary(result: &pipeline::PipelineResult) {
    println!("File: {}", result.origin);
    println!("  Tokens: {}", result.token_count);
    println!("  Comments: {}", result.token_counts.comments);
    println!("  Subprograms: {}", result.subprogram_count());
    println!("  Unparsed statements: {}", result.unparsed_statement_count());
    println!("  AST nodes: {}", result.ast.count_nodes());
    println!(
        "  Time: {:.2}ms",
        result.processing_duration.as_secs_f64() * 1000.0
    );
}

fn process_directory_batch(dir_path: &Path, config: &batch::BatchConfig) -> bool {
    if config.progress_reporting {
        eprintln!(
            "Starting batch processing: {} ({} threads, recursive={}, fail_fast={})",
            dir_path.display(),
            config.effective_threads(),
            config.recursive,
            config.fail_fast
        );
    }

    match batch::process_directory_with_config(dir_path, config) {
        Ok(results) => {
            print_batch_results(&results);
            !results.has_failures()
        }
        Err(error) => {
            eprintln!("Batch processing failed [{}]: {}", error.error_code(), error);
            false
        }
    }
}

fn print_batch_results(results: &batch::BatchResults) {
    println!("{}", results.summary());

    let seconds = results.processing_duration.as_secs_f64();
    if seconds > 0.0 && !results.successful_files.is_empty() {
        let total_tokens: usize = results
            .successful_files
            .iter()
            .map(|(_, result)| result.token_count)
            .sum();
        println!("  Processing rate: {:.0} tokens/sec", total_tokens as f64 / seconds);
    }

    for (file_path, error) in &results.failed_files {
        println!("  failed  {} [{}] {}", file_path.display(), error.stage(), error);
    }
    for (file_path, reason) in &results.skipped_files {
        println!("  skipped {}: {}", file_path.display(), reason);
    }
}

/// Cargo-style report of everything the error collector saw
fn print_collected_errors() {
    if !logging::config::use_cargo_style_output() {
        return;
    }
    if let Some(report) = logging::cargo_style_summary() {
        eprintln!("{}", report);
    }
}
