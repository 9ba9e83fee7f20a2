// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, picks the Burn backend, and delegates to Layer 2.
//
//   steering-trainer --train_logs .. --test_logs .. --validate_logs ..
//   steering-trainer evaluate --logs ..
//   steering-trainer predict frame1.png frame2.png
//
// Only this layer prints to stdout.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BackendKind, Commands, EvaluateArgs, PredictArgs, TrainArgs};

use crate::application::{
    evaluate_use_case::{EvaluateUseCase, PredictUseCase},
    train_use_case::{PipelineConfig, TrainUseCase},
};
use crate::data::prefetch::PrefetchConfig;
use crate::ml::evaluator::Evaluation;
use crate::ml::backend::{
    cpu_device, gpu_device, CpuBackend, CpuTrainBackend, GpuBackend, GpuTrainBackend,
};

#[derive(Parser, Debug)]
#[command(
    name = "steering-trainer",
    version = "0.1.0",
    about = "Train a CNN that predicts steering angles from simulator camera frames.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Optional subcommand; without one a training run starts
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub train: TrainArgs,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Evaluate(args)) => run_evaluate(args),
            Some(Commands::Predict(args))  => run_predict(args),
            None                           => run_train(self.train),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let backend  = args.backend;
    let config   = PipelineConfig::try_from(args)?;
    let use_case = TrainUseCase::new(config);

    tracing::info!("Training on '{}' ({:?} backend)", use_case.config().train_logs.display(), backend);

    let print_scores = |test: &Evaluation, validation: &Evaluation| {
        println!("Test MSE: {:.6}", test.mse);
        println!("Validation MSE: {:.6}", validation.mse);
    };

    match backend {
        BackendKind::Wgpu    => use_case.execute_with::<GpuTrainBackend>(&gpu_device(), print_scores)?,
        BackendKind::Ndarray => use_case.execute_with::<CpuTrainBackend>(&cpu_device(), print_scores)?,
    };
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let use_case = EvaluateUseCase {
        store:       args.model.store(),
        logs:        args.logs,
        num_samples: args.num_samples,
        in_memory:   args.in_memory,
        batch_size:  args.batch_size,
        prefetch:    PrefetchConfig {
            workers:    args.workers,
            chunk_size: args.batch_size.max(1),
            ..PrefetchConfig::default()
        },
    };

    let eval = match args.backend {
        BackendKind::Wgpu    => use_case.execute::<GpuBackend>(&gpu_device())?,
        BackendKind::Ndarray => use_case.execute::<CpuBackend>(&cpu_device())?,
    };

    println!("MSE: {:.6}", eval.mse);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let use_case = PredictUseCase { store: args.model.store(), images: args.images };

    let predictions = match args.backend {
        BackendKind::Wgpu    => use_case.execute::<GpuBackend>(gpu_device())?,
        BackendKind::Ndarray => use_case.execute::<CpuBackend>(cpu_device())?,
    };

    for (path, angle) in predictions {
        println!("{}: {:.6}", path.display(), angle);
    }
    Ok(())
}
