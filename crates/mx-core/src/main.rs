//! mortyx - epsilon-greedy client for the portal game.
//!
//! Runs a single episode against the portal API (or the built-in simulator
//! with `--simulate`) and prints a report on stdout. Logs go to stderr.

use clap::{Args, Parser};
use mx_common::error::format_error_human;
use mx_common::{OutputFormat, Result, CHANNEL_COUNT};
use mx_core::config::{load_config, ConfigOptions, ConfigOverrides, Credential};
use mx_core::episode::{EpisodeOutcome, EpisodeReport, EpisodeRunner};
use mx_core::exit_codes::ExitCode;
use mx_core::log_event;
use mx_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use mx_core::policy::{ActionTable, PolicyEngine};
use mx_core::report::{render_error, render_report};
use mx_core::transport::{HttpPortalClient, SimulatedPortal, SimulationConfig};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Play one episode of the portal game with an epsilon-greedy policy
#[derive(Parser, Debug)]
#[command(name = "mortyx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Portal token, sent verbatim as the Authorization header
    #[arg(long, env = "AUTH_HEADER", hide_env_values = true)]
    token: Option<String>,

    /// Portal base URL
    #[arg(long, env = "MX_BASE_URL")]
    base_url: Option<String>,

    /// Config file (JSON)
    #[arg(long, env = "MX_CONFIG")]
    config: Option<PathBuf>,

    /// Exploration probability, in (0, 1]
    #[arg(long)]
    epsilon: Option<f64>,

    /// Seed for the policy RNG (reproducible decisions)
    #[arg(long)]
    seed: Option<u64>,

    /// Per-request timeout (seconds)
    #[arg(long)]
    timeout: Option<u64>,

    /// Stop after this many steps
    #[arg(long)]
    max_steps: Option<u64>,

    #[command(flatten)]
    sim: SimArgs,

    /// Report format on stdout
    #[arg(long, short = 'f', default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Disable colored error output
    #[arg(long)]
    no_color: bool,
}

/// Offline simulation options
#[derive(Args, Debug)]
struct SimArgs {
    /// Play against the built-in simulator instead of the portal
    #[arg(long)]
    simulate: bool,

    /// Initial pool of the simulated episode [default: 1000]
    #[arg(long, requires = "simulate")]
    sim_pool: Option<u32>,

    /// Per-channel survival odds, e.g. 0.75,0.5,0.3
    #[arg(long, value_parser = parse_survival, requires = "simulate")]
    sim_survival: Option<[f64; CHANNEL_COUNT]>,

    /// Seed for simulated outcomes (defaults to the policy seed, else 0)
    #[arg(long, requires = "simulate")]
    sim_seed: Option<u64>,
}

impl SimArgs {
    fn config(&self, policy_seed: Option<u64>) -> SimulationConfig {
        let defaults = SimulationConfig::default();
        SimulationConfig {
            initial_pool: self.sim_pool.unwrap_or(defaults.initial_pool),
            survival: self.sim_survival.unwrap_or(defaults.survival),
            seed: self.sim_seed.or(policy_seed).unwrap_or(defaults.seed),
            fail_after_sends: None,
        }
    }
}

fn parse_survival(raw: &str) -> std::result::Result<[f64; CHANNEL_COUNT], String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != CHANNEL_COUNT {
        return Err(format!(
            "expected {} comma-separated probabilities, got {}",
            CHANNEL_COUNT,
            parts.len()
        ));
    }
    let mut out = [0.0; CHANNEL_COUNT];
    for (slot, part) in out.iter_mut().zip(parts) {
        let p: f64 = part
            .parse()
            .map_err(|_| format!("not a number: {:?}", part))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(format!("probability out of range [0, 1]: {}", p));
        }
        *slot = p;
    }
    Ok(out)
}

// ============================================================================
// Signal handling
// ============================================================================

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
    // A second signal terminates immediately.
    unsafe {
        libc::signal(signal, libc::SIG_DFL);
    }
}

fn install_signal_handlers() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    unsafe {
        libc::signal(libc::SIGINT, handler);
        libc::signal(libc::SIGTERM, handler);
    }
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.verbose, cli.quiet),
        cli.log_format,
    );
    init_logging(&log_config);
    install_signal_handlers();

    let mode = if cli.sim.simulate { "simulated" } else { "live" };
    let ctx = LogContext::new(generate_run_id(), mode);

    let exit_code = match run_episode(&cli, &ctx)
        .and_then(|report| emit(&mut std::io::stdout().lock(), cli.format, &report))
    {
        Ok(code) => code,
        Err(err) => fail(&cli, &ctx, &err),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Finish,
        "run finished",
        exit_code = exit_code.code_name()
    );

    std::process::exit(exit_code.as_i32());
}

fn run_episode(cli: &Cli, ctx: &LogContext) -> Result<EpisodeReport> {
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "run started",
        version = env!("CARGO_PKG_VERSION")
    );

    let options = ConfigOptions {
        config_dir: None,
        config_path: cli.config.clone(),
    };
    let overrides = ConfigOverrides {
        epsilon: cli.epsilon,
        base_url: cli.base_url.clone(),
        timeout_secs: cli.timeout,
        seed: cli.seed,
        max_steps: cli.max_steps,
    };
    let resolved = load_config(&options, &overrides)?;
    let agent = &resolved.agent;

    log_event!(
        ctx,
        DEBUG,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "config resolved",
        config_path = tracing::field::debug(&resolved.config_path),
        epsilon = agent.epsilon,
        base_url = agent.base_url.as_str()
    );

    let table = ActionTable::seeded(agent.bootstrap_action, agent.bootstrap_reward);
    let mut engine = PolicyEngine::from_seed(agent.policy_params(), table, agent.seed)?;
    let runner = EpisodeRunner::new(ctx.clone())
        .with_max_steps(agent.max_steps)
        .with_cancel_flag(&INTERRUPTED);

    let mut report = if cli.sim.simulate {
        let portal = SimulatedPortal::new(cli.sim.config(agent.seed));
        runner.run(&mut engine, &portal)?
    } else {
        let credential = Credential::from_option(cli.token.clone())?;
        let client = HttpPortalClient::new(agent.http_config(credential));
        runner.run(&mut engine, &client)?
    };
    report.config = Some(resolved.snapshot());
    Ok(report)
}

/// Write the report to `out` and pick the exit code for the outcome.
fn emit(out: &mut impl Write, format: OutputFormat, report: &EpisodeReport) -> Result<ExitCode> {
    if let Some(text) = render_report(report, format)? {
        writeln!(out, "{}", text)?;
        out.flush()?;
    }
    Ok(match report.outcome {
        EpisodeOutcome::Completed => ExitCode::Clean,
        EpisodeOutcome::StepCapReached => ExitCode::StepCapReached,
    })
}

fn fail(cli: &Cli, ctx: &LogContext, err: &mx_common::Error) -> ExitCode {
    let code = ExitCode::from(err);
    log_event!(
        ctx,
        WARN,
        event_names::EPISODE_ABORTED,
        Stage::Finish,
        "run failed",
        error_code = err.code(),
        exit_code = code.code_name()
    );

    let use_color = !cli.no_color && std::io::stderr().is_terminal();
    eprintln!("{}", format_error_human(err, use_color));

    match render_error(&ctx.run_id, err, cli.format) {
        Ok(Some(text)) => println!("{}", text),
        Ok(None) => {}
        Err(render_err) => eprintln!("failed to render error report: {}", render_err),
    }
    code
}
