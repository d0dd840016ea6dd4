//! embdl CLI — download a web video through the local helper service.
//!
//! Usage:
//!   embdl -url <url> [-vt both|video|audio]... [-dir <path>]... [-fn <name>]...
//!
//! Every combination of type × dir × filename becomes one download.

use std::process::ExitCode;

use embdl_core::{BatchReport, Dispatcher, HelperService, ServiceConfig, UreqClient, USAGE};

const EXIT_OK: u8 = 0;
const EXIT_HELPER: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    ExitCode::from(run(args, &ServiceConfig::from_env()))
}

/// Whole CLI flow. Failed downloads still exit 0; the summary reports them.
fn run(args: Vec<String>, config: &ServiceConfig) -> u8 {
    if matches!(args.first().map(String::as_str), Some("-h" | "--help")) {
        print_usage();
        return EXIT_OK;
    }

    let parsed = match embdl_core::parse(args) {
        Ok(parsed) => parsed,
        Err(usage) => {
            for error in &usage.errors {
                println!("Error: {}", error);
            }
            print_usage();
            return EXIT_USAGE;
        }
    };

    // Stopped on drop as well, so every return below cleans up.
    let service = HelperService::new(config);
    if let Err(e) = service.start() {
        log::error!("embdl: {}", e);
        println!("Error: {}", e);
        return EXIT_HELPER;
    }
    service.wait_ready(&config.endpoint, config.startup_wait);

    let requests = parsed.requests();
    println!("downloading {} ({} request(s))", parsed.url, requests.len());

    let client = UreqClient::new(config.request_timeout);
    let result = Dispatcher::new(&service, &client, &config.endpoint).run_batch(requests);
    service.stop();

    match result {
        Ok(report) => {
            log::info!("embdl: batch finished: {}", report.summary());
            print_report(&report);
            EXIT_OK
        }
        Err(e) => {
            log::error!("embdl: batch aborted: {}", e);
            println!("Error: {}", e);
            EXIT_HELPER
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_report(report: &BatchReport) {
    for (request, reply) in &report.succeeded {
        match &reply.title {
            Some(title) => println!("ok      {}  ({})", request, title),
            None => println!("ok      {}", request),
        }
        println!("        {}", reply.body.trim());
    }
    for (request, error) in &report.failed {
        println!("failed  {}", request);
        println!("        {}", error);
    }
    println!("{}", report.summary());
}

fn print_usage() {
    println!("{}", USAGE);
}
