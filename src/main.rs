use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use env_logger::{Builder, Target};
use log::{debug, info, LevelFilter};

use matfree::configs::Assembly;
use matfree::defaults::{DEFAULT_ASSEMBLY, DEFAULT_SIGNIFICANT};
use matfree::{adjoint_test, block_diag, hstack, to_linear_operator, to_matrix, vstack};
use matfree::{LinearOperator, RMatrix};

use crate::io::{read_npz, write_npz};

mod io;

fn assemble(assembly: Assembly, blocks: &[LinearOperator]) -> Result<LinearOperator> {
    let op = match assembly {
        Assembly::Hstack => hstack(blocks)?,
        Assembly::Vstack => vstack(blocks)?,
        Assembly::BlockDiag => block_diag(blocks)?,
    };
    Ok(op)
}

fn main() -> Result<()> {
    // read CLI arguments
    let matches = Command::new("matfree")
        .version("0.1")
        .about("Assembles the matrices of an npz archive into a matrix-free block operator")
        .arg(
            Arg::new("input")
                .value_name("npz_path")
                .help("Sets the path to the input npz archive")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .value_name("output")
                .short('o')
                .long("output")
                .help("Sets the prefix of the output file [default: same as input file]")
                .required(false),
        )
        .arg(
            Arg::new("assembly")
                .value_name("assembly")
                .short('a')
                .long("assembly")
                .help(format!(
                    "Sets how the matrices are assembled [default: {}]",
                    DEFAULT_ASSEMBLY
                ))
                .required(false)
                .value_parser(["hstack", "vstack", "diag"]),
        )
        .arg(
            Arg::new("significant")
                .value_name("significant")
                .short('s')
                .long("significant")
                .help(format!(
                    "Sets the significant digits of the adjoint test [default: {}]",
                    DEFAULT_SIGNIFICANT
                ))
                .required(false)
                .value_parser(value_parser!(i32)),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Use debug mode"),
        )
        .get_matches();

    let npz_path: PathBuf = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .context("missing input path")?;
    let out_path: PathBuf = match matches.get_one::<String>("output") {
        Some(prefix) => PathBuf::from(prefix).with_extension("npz"),
        None => {
            let stem = npz_path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("input path has no file name")?;
            npz_path.with_file_name(format!("{}_operator.npz", stem))
        }
    };
    let assembly: Assembly = match matches.get_one::<String>("assembly").map(String::as_str) {
        None => DEFAULT_ASSEMBLY,
        Some("hstack") => Assembly::Hstack,
        Some("vstack") => Assembly::Vstack,
        Some("diag") => Assembly::BlockDiag,
        Some(other) => bail!("Invalid assembly '{}'!", other),
    };
    let significant: i32 = *matches
        .get_one::<i32>("significant")
        .unwrap_or(&DEFAULT_SIGNIFICANT);
    let debug: bool = matches.get_flag("debug");

    // initialise logger
    let mut builder = Builder::new();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }
    builder.target(Target::Stdout);
    builder.init();

    info!("Input npz file: {}", npz_path.display());
    info!("Output npz file: {}", out_path.display());
    info!("Assembly: {}", assembly);
    info!("Significant digits: {}", significant);

    let start = Instant::now();
    let arrays = read_npz(&npz_path)?;
    if arrays.is_empty() {
        bail!("{} holds no arrays", npz_path.display());
    }
    let blocks = arrays
        .iter()
        .map(|(name, array)| {
            let op = to_linear_operator(array)
                .with_context(|| format!("cannot lift array '{}'", name))?;
            info!("Block '{}': {:?}", name, op.shape());
            Ok(op)
        })
        .collect::<Result<Vec<LinearOperator>>>()?;
    debug!("Time elapsed in reading npz file is: {:?}", start.elapsed());

    let start = Instant::now();
    let op = assemble(assembly, &blocks)?;
    info!("Assembled operator: {:?}", op.shape());
    debug!("Time elapsed in assembly is: {:?}", start.elapsed());

    let start = Instant::now();
    let adjoint = adjoint_test(&op, significant);
    match &adjoint {
        Ok(()) => info!("Adjoint test passed to {} significant digits.", significant),
        Err(err) => info!("Adjoint test failed: {}", err),
    }
    debug!("Time elapsed in adjoint test is: {:?}", start.elapsed());

    let start = Instant::now();
    let matrix: RMatrix = to_matrix(&op)?;
    let transpose: Option<RMatrix> = match op.transpose() {
        Ok(op_t) => Some(to_matrix(&op_t)?),
        Err(_) => None,
    };
    debug!("Time elapsed in materialization is: {:?}", start.elapsed());

    write_output(&out_path, &matrix, transpose.as_ref())?;
    adjoint?;
    Ok(())
}

fn write_output(out_path: &Path, matrix: &RMatrix, transpose: Option<&RMatrix>) -> Result<()> {
    let mut arrays = vec![("matrix", matrix)];
    if let Some(transpose) = transpose {
        arrays.push(("transpose", transpose));
    }
    write_npz(out_path, &arrays)
}
