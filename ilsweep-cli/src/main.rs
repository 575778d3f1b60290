mod log;

use std::{
    io::{self, Write},
    path::Path,
    thread,
    time::Duration,
};

use clap::{Args, Parser, Subcommand};

use ilsweep_core::{
    signals::{write_signal_to_file, Tone},
    AudioEngine, Outcome, ProgressSink, Snapshot, SweepController, SweepParameters, SweepPlan,
    DEFAULT_SAMPLE_RATE,
};

#[derive(Parser)]
#[clap(author, version)]
struct Cli {
    #[command(subcommand)]
    subcommand: Command,
}

#[derive(Args)]
struct SweepArgs {
    #[clap(short, long, default_value_t = 100)]
    start_frequency: u16,
    #[clap(short, long, default_value_t = 1000)]
    end_frequency: u16,
    #[clap(long, default_value_t = 100)]
    step: u16,
    #[clap(short, long, default_value_t = 1.0)]
    tone_duration: f32,
    #[clap(short, long, default_value_t = 0.5)]
    delay: f32,
}

impl SweepArgs {
    fn to_parameters(&self) -> SweepParameters {
        // Negative or non-finite input collapses to zero, which the
        // planner rejects with a proper error message.
        let seconds =
            |value: f32| Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO);

        SweepParameters {
            start_frequency: self.start_frequency,
            end_frequency: self.end_frequency,
            step: self.step,
            tone_duration: seconds(self.tone_duration),
            inter_tone_delay: seconds(self.delay),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Play the sweep through a jack output port.
    Run {
        #[command(flatten)]
        sweep: SweepArgs,
        #[clap(short, long, default_value_t = 0.5)]
        volume: f32,
        #[arg(long = "dest-port")]
        dest_ports: Vec<String>,
    },
    /// Write the sweep to a mono 16 bit wav file.
    Export {
        #[command(flatten)]
        sweep: SweepArgs,
        file_path: String,
    },
    /// Print the frequency table without producing audio.
    Plan {
        #[command(flatten)]
        sweep: SweepArgs,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(err) = log::init() {
        eprintln!("ilsweep: failed to initialize logger: {err}");
    }

    let cli = Cli::parse();

    match cli.subcommand {
        Command::Run {
            sweep,
            volume,
            dest_ports,
        } => run_sweep(&sweep.to_parameters(), volume, &dest_ports),
        Command::Export { sweep, file_path } => {
            export_sweep(&sweep.to_parameters(), Path::new(&file_path))
        }
        Command::Plan { sweep } => print_plan(&sweep.to_parameters()),
    }
}

fn run_sweep(
    parameters: &SweepParameters,
    volume: f32,
    dest_ports: &[String],
) -> anyhow::Result<()> {
    let jack_client_name = env!("CARGO_BIN_NAME");
    let mut engine = AudioEngine::new(jack_client_name)?;

    if dest_ports.is_empty() {
        log::warn!("no --dest-port given, the sweep will not be audible anywhere");
        for port in engine.out_ports() {
            log::info!("available destination port: {port}");
        }
    }

    engine.register_out_port("sweep_out", dest_ports)?;
    engine.set_volume(volume);

    let controller = SweepController::new(engine.sample_rate());

    let handle = controller.handle();
    thread::spawn(move || {
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_ok() {
            handle.stop();
        }
    });

    println!("Press enter to stop the sweep.");

    let outcome = controller.run(parameters, &mut engine, &mut TerminalProgress)?;
    println!();

    match outcome {
        Outcome::Completed => log::info!("sweep finished"),
        Outcome::Cancelled => log::info!("sweep cancelled"),
        Outcome::AlreadyRunning => {}
    }

    Ok(())
}

struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn update(&mut self, snapshot: &Snapshot) {
        print!(
            "\x1b[2K\r{}: {:.2} s remaining, {:>5.1} %",
            snapshot.stage,
            snapshot.remaining.as_secs_f32(),
            snapshot.progress() * 100.0
        );
        io::stdout().flush().unwrap();
    }
}

fn export_sweep(parameters: &SweepParameters, path: &Path) -> anyhow::Result<()> {
    let plan = SweepPlan::new(parameters)?;

    let gap_samples =
        (DEFAULT_SAMPLE_RATE as f64 * parameters.inter_tone_delay.as_secs_f64()) as usize;

    let mut samples: Vec<i16> = Vec::new();
    for (index, &frequency) in plan.iter().enumerate() {
        let tone = Tone::new(frequency, parameters.tone_duration, DEFAULT_SAMPLE_RATE)?;
        samples.extend(tone);

        if index + 1 != plan.len() {
            samples.extend(std::iter::repeat(0).take(gap_samples));
        }
    }

    write_signal_to_file(Box::new(samples.into_iter()), path)?;

    log::info!("sweep written to {}", path.display());

    Ok(())
}

fn print_plan(parameters: &SweepParameters) -> anyhow::Result<()> {
    let plan = SweepPlan::new(parameters)?;

    for frequency in plan.iter() {
        println!("{frequency} Hz");
    }

    println!(
        "{} tones, {:.2} s total",
        plan.len(),
        plan.total_duration().as_secs_f32()
    );

    Ok(())
}
