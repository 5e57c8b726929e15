use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use human_bytes::human_bytes;
use qatcodec::codec::qat::{PollingMode, SessionParams};
use qatcodec::codec::registry::{make_codec, CodecKind, CodecOptions};
use qatcodec::codec::Codec;
use qatcodec::frame::{compress_frames, decompress_frames, Measurement};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::exit;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about = "Compress files with software codecs or a QAT accelerator")]
struct Config {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a file
    Compress(CompressionCfg),
    /// Decompress a file
    Decompress(DecompressionCfg),
    /// Benchmark compression+decompression of a single file
    Benchmark(CompressionCfg),
    /// Run multiple benchmarks
    BenchmarkMany(BenchmarkManyCfg),
}

#[derive(Args, Clone)]
struct SessionCfg {
    /// How the QAT backend waits for the device: busy or periodical
    #[arg(long, default_value = "busy")]
    polling_mode: PollingMode,

    /// Fail instead of falling back to software when no QAT device is usable
    #[arg(long)]
    no_sw_backup: bool,
}

#[derive(Args)]
struct CompressionCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// Compression algorithm
    #[arg(long, short = 'a', default_value = "zstd")]
    algorithm: CodecKind,

    /// Compression level
    #[arg(long, short = 'c', default_value = "1", allow_hyphen_values = true)]
    compression: i32,

    /// Size of a file chunk in bytes. Each chunk is compressed independently.
    #[arg(long, short = 'b', default_value = "16384")]
    chunk_size: usize,

    #[clap(flatten)]
    session: SessionCfg,
}

#[derive(Args)]
struct DecompressionCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// Compression algorithm. If not given, determined automatically from the file extension.
    #[clap(long, short = 'a')]
    algorithm: Option<CodecKind>,

    #[clap(flatten)]
    session: SessionCfg,
}

#[derive(Args)]
struct BenchmarkManyCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// List of algorithms to benchmark
    #[arg(long, short = 'a', value_delimiter = ',', default_value = "lz4,snappy,zstd,qat", num_args = 1..)]
    algorithms: Vec<CodecKind>,

    /// Size of a file chunk in bytes. Each chunk is compressed independently.
    #[arg(long, short = 'b', default_value = "16384")]
    chunk_size: usize,

    #[clap(flatten)]
    session: SessionCfg,

    /// Save benchmark results to a CSV file
    #[arg(long, short)]
    report: Option<PathBuf>,
}

fn compression_levels(kind: CodecKind) -> Vec<i32> {
    match kind {
        CodecKind::Zstd => Vec::from_iter((-7..=-1).chain(1..=12)),
        CodecKind::Lz4 => Vec::from_iter((-9..=-1).chain(1..=9)),
        CodecKind::Snappy => vec![0],
        CodecKind::Qat => Vec::from_iter(1..=9),
    }
}

fn kind_from_file_name(path: &Path) -> Option<CodecKind> {
    path.extension()
        .and_then(OsStr::to_str)
        .and_then(CodecKind::from_extension)
}

#[derive(Serialize)]
struct BenchmarkResult {
    algorithm: CodecKind,
    level: i32,
    uncompressed_len: u64,
    compressed_len: u64,
    ratio: f64,
    inv_ratio: f64,
    compression_speed_mpbs: f64,
    decompression_speed_mpbs: f64,
}

impl BenchmarkResult {
    fn new(cfg: &CompressionCfg, compression: Measurement, decompression: Measurement) -> Self {
        Self {
            algorithm: cfg.algorithm,
            level: cfg.compression,
            uncompressed_len: compression.input_len,
            compressed_len: compression.output_len,
            ratio: (compression.compression_ratio() * 1000.0).round() / 1000.0,
            inv_ratio: (1.0 / compression.compression_ratio() * 1000.0).round() / 1000.0,
            compression_speed_mpbs: (compression.input_throughput() / 100_000.0).round() / 10.0,
            decompression_speed_mpbs: (decompression.output_throughput() / 100_000.0).round()
                / 10.0,
        }
    }
}

impl Display for BenchmarkResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:10} lev. {:3}:    {:8} => {:8} ({:5.1}%, {:4.2}x),    compr.: {:6.1} MB/s, decompr.: {:6.1} MB/s",
            self.algorithm.name(),
            self.level,
            human_bytes(self.uncompressed_len as f64),
            human_bytes(self.compressed_len as f64),
            self.ratio * 100.0,
            1.0 / self.ratio,
            self.compression_speed_mpbs,
            self.decompression_speed_mpbs
        )
    }
}

fn main() {
    let cmd = Config::parse();
    init_logging(cmd.verbose);
    if let Err(e) = run(cmd) {
        tracing::debug!("command failed: {:?}", e);
        eprintln!("error: {:#}", e);
        exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(cmd: Config) -> anyhow::Result<()> {
    match cmd.command {
        Command::Decompress(cfg) => run_decompress_cmd(cfg),
        Command::Compress(cfg) => run_compress_cmd(cfg),
        Command::Benchmark(cfg) => run_benchmark_cmd(cfg).map(|_| ()),
        Command::BenchmarkMany(cfg) => run_benchmark_many_cmd(cfg),
    }
}

fn run_decompress_cmd(cfg: DecompressionCfg) -> anyhow::Result<()> {
    let Some(algorithm) = cfg
        .algorithm
        .or_else(|| kind_from_file_name(&cfg.path))
    else {
        bail!("Cannot determine compression algorithm from the extension. Please use -a/--algorithm option.");
    };

    let mut codec = codec(algorithm, 1, &cfg.session)?;
    let input = open_input(&cfg.path)?;
    let output = BufWriter::new(open_output(&cfg.path, algorithm, false)?);
    let result = decompress_frames(input, output, codec.as_mut())?;
    eprintln!(
        "{}, {:.1} MB/s",
        result.format_compression(),
        result.output_throughput() / 1_000_000.0
    );
    Ok(())
}

fn run_compress_cmd(cfg: CompressionCfg) -> anyhow::Result<()> {
    let mut codec = codec(cfg.algorithm, cfg.compression, &cfg.session)?;
    let input = open_input(&cfg.path)?;
    let output = BufWriter::new(open_output(&cfg.path, cfg.algorithm, true)?);
    let result = compress_frames(input, output, cfg.chunk_size, codec.as_mut())?;
    eprintln!(
        "{}, {:.1} MB/s",
        result.format_compression(),
        result.input_throughput() / 1_000_000.0
    );
    Ok(())
}

fn run_benchmark_cmd(cfg: CompressionCfg) -> anyhow::Result<BenchmarkResult> {
    let mut codec = codec(cfg.algorithm, cfg.compression, &cfg.session)?;

    let mut input = open_input(&cfg.path)?;
    let mut buffered_input = Vec::new();
    input.read_to_end(&mut buffered_input)?;
    let input_len = buffered_input.len();

    let mut output = Vec::<u8>::with_capacity(input_len);
    let c_perf = compress_frames(Cursor::new(buffered_input), &mut output, cfg.chunk_size, codec.as_mut())?;
    let d_perf = decompress_frames(Cursor::new(output), io::sink(), codec.as_mut())?;
    let result = BenchmarkResult::new(&cfg, c_perf, d_perf);
    println!("{}", result);
    Ok(result)
}

fn run_benchmark_many_cmd(cfg: BenchmarkManyCfg) -> anyhow::Result<()> {
    let mut results = Vec::new();

    for algorithm in cfg.algorithms {
        for level in compression_levels(algorithm) {
            let run_cfg = CompressionCfg {
                path: cfg.path.clone(),
                algorithm,
                compression: level,
                chunk_size: cfg.chunk_size,
                session: cfg.session.clone(),
            };
            results.push(run_benchmark_cmd(run_cfg)?);
        }
    }

    if let Some(path) = cfg.report {
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Could not create report {}", path.display()))?;
        for result in results {
            writer.serialize(&result)?;
        }
        writer.flush()?;
    }

    Ok(())
}

fn codec(
    algorithm: CodecKind,
    compression: i32,
    session: &SessionCfg,
) -> anyhow::Result<Box<dyn Codec>> {
    let options = CodecOptions {
        level: compression,
        session: SessionParams {
            polling_mode: session.polling_mode,
            // Out-of-range levels are left for the session setup to reject.
            compression_level: u32::try_from(compression).unwrap_or(0),
            sw_backup: !session.no_sw_backup,
            ..Default::default()
        },
    };
    make_codec(algorithm, &options).with_context(|| format!("Could not create {} codec", algorithm))
}

fn open_input(path: &Path) -> io::Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Could not open file {}: {}", path.display(), e))
    })?;
    Ok(BufReader::new(file))
}

fn open_output(input_path: &Path, kind: CodecKind, compress: bool) -> io::Result<File> {
    let output_path = if compress {
        let new_extension = match input_path.extension() {
            None => kind.extension().to_owned(),
            Some(ext) => format!("{}.{}", ext.to_string_lossy(), kind.extension()),
        };
        input_path.with_extension(new_extension)
    } else {
        input_path.with_extension("")
    };
    File::create(&output_path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Could not create file {}: {}", output_path.display(), e),
        )
    })
}
