use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use doc_batch_extractor::orchestrator::BatchReport;
use doc_batch_extractor::utils::logging;
use doc_batch_extractor::{App, Config};

/// 批量抽取扫描件/PDF 中的结构化数据
#[derive(Parser)]
#[command(name = "doc-batch")]
#[command(version)]
struct Cli {
    /// 使用的 prompt（覆盖 PROMPT_KEY）
    #[arg(short, long)]
    prompt_key: Option<String>,

    /// 输入目录（覆盖 INPUT_DIR）
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// 输出目录（覆盖 OUTPUT_DIR）
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// 覆盖已存在的输出
    #[arg(long)]
    overwrite: bool,

    /// 单个文件大小上限 (MB)
    #[arg(long)]
    max_file_mb: Option<u64>,

    /// prompt 目录文件（覆盖 PROMPTS_PATH）
    #[arg(long)]
    prompts: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(key) = self.prompt_key {
            config.prompt_key = key;
        }
        if let Some(dir) = self.input_dir {
            config.input_dir = dir.display().to_string();
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir.display().to_string();
        }
        if self.overwrite {
            config.overwrite_output = true;
        }
        if let Some(limit) = self.max_file_mb {
            config.max_file_mb = limit;
        }
        if let Some(path) = self.prompts {
            config.prompts_path = path.display().to_string();
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    cli.apply(&mut config);

    let log_file = match logging::init(&config.log_level, &config.log_dir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            return ExitCode::from(1);
        }
    };

    match run(config).await {
        Ok(report) => {
            logging::print_final_stats(&report, &log_file);
            print_report(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            tracing::error!("❌ 运行中止: {:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(config: Config) -> anyhow::Result<BatchReport> {
    let app = App::initialize(config).await?;
    app.run().await
}

fn print_report(report: &BatchReport) {
    println!(
        "已处理: {} | OK: {} | KO: {}",
        report.total(),
        report.ok_count(),
        report.ko_count()
    );
    for failure in report.failures() {
        println!(" - 错误: {} -> {}", failure.filename(), failure.error_message());
    }
    if let Some(summary) = &report.summary {
        match &summary.outcome {
            Ok(_) => println!("汇总表: {}", summary.path.display()),
            Err(e) => println!(" - 汇总表写入失败: {} -> {}", summary.path.display(), e),
        }
    }
}
