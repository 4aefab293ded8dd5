use std::io::Write;
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Ok, Result};
use clap::{Args, Parser as ClapParser};
use thiserror::Error;

use codegen::gen_assm;
use emission::output;
use lexer::{Lexer, TokenType};
use mir::{debug_tacky, gen_tacky};
use parser::Parser;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = "Runs the cinder C compiler")]
struct CLI {
    /// Path to C source file
    path: String,

    /// Specifies a point in the compilation process for cinder to stop
    #[command(flatten)]
    stage_options: StageOptions,
}

/// Run C compiler with optional arguments
#[derive(Args, Debug)]
#[group(required = false, multiple = true)]
struct StageOptions {
    /// Stop after lexer
    #[arg(long)]
    lex: bool,

    /// Stop after parser
    #[arg(long)]
    parse: bool,

    /// Stop after TACKY generation
    #[arg(long)]
    tacky: bool,

    /// Stop after assembly generation
    #[arg(long)]
    codegen: bool,

    /// Emit assembly file, but do not assemble or link it
    #[arg(short = 'S')]
    s: bool,

    /// Write out tacky code
    #[arg(short = 'd')]
    debug: bool,
}

/// Which stage the compiler should stop at
enum StopStage {
    Lexer,
    Parser,
    Tacky,
    CodeGen,
    Assembler,
}

impl StopStage {
    fn from_args(options: &StageOptions) -> Option<StopStage> {
        if options.lex {
            Some(StopStage::Lexer)
        } else if options.parse {
            Some(StopStage::Parser)
        } else if options.tacky {
            Some(StopStage::Tacky)
        } else if options.codegen {
            Some(StopStage::CodeGen)
        } else if options.s {
            Some(StopStage::Assembler)
        } else {
            None
        }
    }
}

pub fn main() -> Result<()> {
    let args = CLI::parse();

    let stop_stage = StopStage::from_args(&args.stage_options);

    run_driver(&args.path, &stop_stage, args.stage_options.debug)
}

fn run_driver(path: &str, stop_stage: &Option<StopStage>, debug: bool) -> Result<()> {
    let source_path = Path::new(path);
    let (pp_path, assembly_path, binary_path) = sibling_paths(source_path);

    // Preprocess input
    let preprocessed = Command::new("gcc")
        .arg("-E")
        .arg("-P")
        .arg(source_path)
        .arg("-o")
        .arg(&pp_path)
        .output()
        .context("Failed to execute preprocessor process")?;

    check_preprocessor(&preprocessed)?;

    let compiled = compile(&pp_path, stop_stage, &assembly_path, debug);

    // delete preprocessed file whether or not compilation succeeded
    Command::new("rm")
        .arg(&pp_path)
        .output()
        .context("Failed to delete preprocessed file")?;

    if !compiled? {
        // stopped at an intermediate stage, nothing to assemble
        return Ok(());
    }

    if let Some(StopStage::Assembler) = stop_stage {
        return Ok(());
    }

    let assembled = Command::new("gcc")
        .arg(&assembly_path)
        .arg("-o")
        .arg(&binary_path)
        .output()
        .context("Failed to execute assembler and linker")?;

    std::io::stdout().write_all(&assembled.stdout)?;
    std::io::stderr().write_all(&assembled.stderr)?;

    Ok(())
}

/// Intermediate and output files land next to the source file. A bare file
/// name like "t.c" gets bare siblings ("t.i", "t.s", "t") rather than
/// paths rooted at "/".
fn sibling_paths(source: &Path) -> (PathBuf, PathBuf, PathBuf) {
    (
        source.with_extension("i"),
        source.with_extension("s"),
        source.with_extension(""),
    )
}

fn check_preprocessor(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(CompileErr::Preprocessor(String::from_utf8_lossy(&output.stderr).into_owned()).into())
}

/// Run the compiler stages proper: lex, parse, TACKY, codegen, emission.
/// Returns false if a stop stage ended compilation before assembly output.
fn compile(
    path: &Path,
    stop_stage: &Option<StopStage>,
    assm_path: &Path,
    debug: bool,
) -> Result<bool> {
    let source = read_to_string(path)
        .with_context(|| format!("Unable to read source file: {}", path.display()))?;

    let mut lexer = Lexer::new(&source);

    let (tokens, errors): (Vec<_>, Vec<_>) = lexer.tokenize().partition(|t| {
        !matches!(
            t.kind,
            TokenType::Unknown | TokenType::InvalidIdent | TokenType::InvalidConstant
        )
    });

    if !errors.is_empty() {
        let error_msgs = errors
            .iter()
            .map(|err| {
                format!(
                    "{:?} at {}:{}: '{}'",
                    err.value,
                    err.line,
                    err.col,
                    &source[err.start..err.end]
                )
            })
            .collect();

        return Err(CompileErr::Lexer(error_msgs).into());
    }

    if let Some(StopStage::Lexer) = stop_stage {
        return Ok(false);
    }

    let mut parser = Parser::new(tokens);
    let ast = parser.parse()?;

    if let Some(StopStage::Parser) = stop_stage {
        return Ok(false);
    }

    let tacky = gen_tacky(ast);

    if debug {
        let tacky_name = assm_path.with_extension("tacky").to_string_lossy().into_owned();

        debug_tacky(&tacky, tacky_name)?;
    }

    if let Some(StopStage::Tacky) = stop_stage {
        return Ok(false);
    }

    let assm_ast = gen_assm(&tacky);

    if let Some(StopStage::CodeGen) = stop_stage {
        return Ok(false);
    }

    output(assm_path, &assm_ast)?;

    Ok(true)
}

#[derive(Error, Debug)]
enum CompileErr {
    #[error("Lexer encountered an error(s): {:#?}", .0)]
    Lexer(Vec<String>),
    #[error("Preprocessor failed: {0}")]
    Preprocessor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_keeps_outputs_beside_source() {
        let (pp, assembly, binary) = sibling_paths(Path::new("t.c"));

        assert_eq!(pp, Path::new("t.i"));
        assert_eq!(assembly, Path::new("t.s"));
        assert_eq!(binary, Path::new("t"));
    }

    #[test]
    fn nested_source_keeps_its_directory() {
        let (pp, assembly, binary) = sibling_paths(Path::new("progs/nested/t.c"));

        assert_eq!(pp, Path::new("progs/nested/t.i"));
        assert_eq!(assembly, Path::new("progs/nested/t.s"));
        assert_eq!(binary, Path::new("progs/nested/t"));
    }

    #[test]
    fn failed_preprocessor_reports_its_stderr() {
        let output = Command::new("sh")
            .arg("-c")
            .arg("echo 'missing.c: No such file or directory' >&2; exit 1")
            .output()
            .unwrap();

        let err = check_preprocessor(&output).unwrap_err();

        assert!(err.to_string().contains("No such file or directory"));
    }

    #[test]
    fn successful_preprocessor_passes() {
        let output = Command::new("sh").arg("-c").arg("exit 0").output().unwrap();

        assert!(check_preprocessor(&output).is_ok());
    }
}
