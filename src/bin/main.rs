//! CLI tool for Storage Monitor (stormon)

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "stormon-cli")]
#[command(about = "Storage Monitor: physical disk identity, drive letters, capacity and I/O counters", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Update interval in seconds (defaults to the configured interval)
    #[arg(short, long, global = true)]
    interval: Option<f64>,

    /// Output format (json or text)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Configuration file (defaults to the per-user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// List physical disks (default)
    List,
    /// Show the drive letters mounted on a disk
    Letters {
        /// Physical drive index
        index: u32,
    },
    /// Show everything known about a disk
    Info {
        /// Physical drive index
        index: u32,
    },
    /// Sample performance counters and print per-interval rates
    Stats {
        /// Physical drive index
        index: u32,
        /// Number of intervals to print
        #[arg(short = 'n', long, default_value = "5")]
        count: u32,
    },
}

#[cfg(feature = "cli")]
struct Options {
    config: stormon::Config,
    interval: Duration,
    json: bool,
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::init();

    let config = match &cli.config {
        Some(path) => stormon::Config::load_from(path)?,
        None => stormon::Config::load()?,
    };

    let interval = match cli.interval {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => Duration::from_secs_f64(seconds),
        Some(seconds) => return Err(format!("invalid interval: {}", seconds).into()),
        None => Duration::from_millis(config.general.update_interval_ms as u64),
    };

    let format = cli.format.as_deref().unwrap_or(&config.display.format);
    let json = match format {
        "json" => true,
        "text" => false,
        other => return Err(format!("unknown output format: {}", other).into()),
    };

    let options = Options {
        config,
        interval,
        json,
    };

    let host = stormon::disk::system_host()?;
    run(&host, cli.command.unwrap_or(Commands::List), &options)
}

#[cfg(feature = "cli")]
fn run<H: stormon::DeviceHost>(
    host: &H,
    command: Commands,
    options: &Options,
) -> Result<(), Box<dyn std::error::Error>> {
    use stormon::disk::{self, DiskDrive};

    match command {
        Commands::List => {
            let disks = disk::enumerate_disks(
                host,
                options.config.scan.max_physical_drives,
                options.config.scan.include_drive_letters,
            );
            if options.json {
                println!("{}", serde_json::to_string_pretty(&disks)?);
            } else {
                print_disk_list(&disks, &options.config.display.columns);
            }
        }
        Commands::Letters { index } => {
            let letters = disk::query_drive_letters_for_device(host, index);
            if options.json {
                println!("{}", serde_json::to_string(&letters)?);
            } else {
                println!("{}", letters);
            }
        }
        Commands::Info { index } => {
            let drive = DiskDrive::open(host, index)?;
            let summary = drive.summary(host, options.config.scan.include_drive_letters);
            if options.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_disk_info(&summary);
            }
        }
        Commands::Stats { index, count } => {
            let drive = DiskDrive::open(host, index)?;
            let mut previous = drive.statistics()?;
            let mut sampled_at = Instant::now();

            if !options.json {
                println!(
                    "=== {} ({}) ===",
                    drive.path(),
                    previous.storage_manager
                );
            }

            for _ in 0..count {
                std::thread::sleep(options.interval);

                let current = drive.statistics()?;
                let now = Instant::now();
                let delta = current.delta(&previous);
                let rates = delta.rates(now - sampled_at);

                if options.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "delta": delta,
                            "rates": rates,
                            "queue_depth": current.queue_depth,
                        })
                    );
                } else {
                    print_rates(&delta, &rates, current.queue_depth);
                }

                previous = current;
                sampled_at = now;
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn column_value(disk: &stormon::DiskSummary, column: &str) -> String {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();
    let flag = |value: bool| if value { "yes" } else { "no" }.to_string();

    match column {
        "index" => disk.index.to_string(),
        "path" => disk.path.clone(),
        "vendor" => text(&disk.identity.vendor),
        "model" => disk.identity.display_name().unwrap_or_default(),
        "revision" => text(&disk.identity.revision),
        "serial" => text(&disk.identity.serial),
        "bus" => disk
            .bus_type
            .map(|bus| format!("{:?}", bus))
            .unwrap_or_default(),
        "letters" => disk.drive_letters.to_string(),
        "capacity" => disk.capacity.clone(),
        "hotplug" => flag(disk.supports_hotplug),
        "prediction" => flag(disk.supports_failure_prediction),
        _ => String::new(),
    }
}

#[cfg(feature = "cli")]
fn print_disk_list(disks: &[stormon::DiskSummary], columns: &[String]) {
    if disks.is_empty() {
        println!("No physical disks found");
        return;
    }

    let rows: Vec<Vec<String>> = disks
        .iter()
        .map(|disk| columns.iter().map(|c| column_value(disk, c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(c.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.to_uppercase(), w = w))
        .collect();
    println!("{}", header.join("  ").trim_end());

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = w))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

#[cfg(feature = "cli")]
fn print_disk_info(disk: &stormon::DiskSummary) {
    let show = |label: &str, value: &Option<String>| {
        println!("{:<12} {}", label, value.as_deref().unwrap_or("-"));
    };

    println!("=== {} ===", disk.path);
    show("Vendor:", &disk.identity.vendor);
    show("Model:", &disk.identity.model);
    show("Revision:", &disk.identity.revision);
    show("Serial:", &disk.identity.serial);
    if let Some(bus) = disk.bus_type {
        println!("{:<12} {:?}", "Bus:", bus);
    }
    if let Some(removable) = disk.removable_media {
        println!("{:<12} {}", "Removable:", removable);
    }
    println!("{:<12} {}", "Letters:", disk.drive_letters);
    println!("{:<12} {}", "Capacity:", disk.capacity);
    println!("{:<12} {}", "Hot-plug:", disk.supports_hotplug);
    println!("{:<12} {}", "Prediction:", disk.supports_failure_prediction);
}

#[cfg(feature = "cli")]
fn print_rates(
    delta: &stormon::disk::PerformanceDelta,
    rates: &stormon::disk::PerformanceRates,
    queue_depth: u32,
) {
    use stormon::units::format_rate;

    let latency = delta
        .average_latency()
        .map(|d| format!("{:.2} ms", d.as_secs_f64() * 1000.0))
        .unwrap_or_else(|| "-".to_string());

    println!(
        "read {:>12} ({:>7.1} IOPS)  write {:>12} ({:>7.1} IOPS)  queue {:>3}  latency {}",
        format_rate(rates.read_bytes_per_sec),
        rates.reads_per_sec,
        format_rate(rates.write_bytes_per_sec),
        rates.writes_per_sec,
        queue_depth,
        latency
    );
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
