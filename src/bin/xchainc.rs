//! Built-in contract export tool.
//!
//! Emits deployable code headers (`-bin`) and ABI JSON (`-abi`) for the
//! built-in contract catalogue.
//!
//! # Usage
//! ```text
//! xchainc (-stdtoken | -nftoken) (-abi | -bin) [-out <file>]
//! ```

use std::env;
use std::fs;
use std::process;
use xchain::vm::abi::export_abi_by_id;
use xchain::vm::contract::BuiltinContract;
use xchain::vm::nftoken::NFToken;
use xchain::vm::token::Token;
use xchain::vm::xvm::code_header;

struct Args {
    contract_id: Option<u8>,
    abi: bool,
    bin: bool,
    out: Option<String>,
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {program} [options]
Options:
  -stdtoken          Select the built-in fungible token contract
  -nftoken           Select the built-in non-fungible token contract
  -abi               Print the contract ABI as JSON
  -bin               Print the deployable contract code as hex
  -out <filename>    Write output to a file instead of stdout
  -h, -help          Display this information"
    );
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args {
        contract_id: None,
        abi: false,
        bin: false,
        out: None,
    };

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-stdtoken" => args.contract_id = Some(Token::BUILTIN_ID),
            "-nftoken" => args.contract_id = Some(NFToken::BUILTIN_ID),
            "-abi" => args.abi = true,
            "-bin" => args.bin = true,
            "-out" => {
                let path = iter.next().ok_or("-out requires a filename")?;
                args.out = Some(path.clone());
            }
            "-h" | "-help" | "--help" => return Err(String::new()),
            other => return Err(format!("unknown option: {other}")),
        }
    }
    Ok(args)
}

fn write_output(out: &Option<String>, content: &str) {
    match out {
        Some(path) => {
            if let Err(err) = fs::write(path, content) {
                eprintln!("failed to write {path}: {err}");
                process::exit(1);
            }
        }
        None => println!("{content}"),
    }
}

fn main() {
    let raw: Vec<String> = env::args().collect();
    let program = raw[0].clone();

    let args = match parse_args(&raw[1..]) {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{message}");
            }
            print_usage(&program);
            process::exit(if message.is_empty() { 0 } else { 1 });
        }
    };

    let Some(id) = args.contract_id else {
        print_usage(&program);
        process::exit(1);
    };

    if args.bin {
        let code = code_header(id);
        write_output(&args.out, &format!("0x{}", hex::encode(code)));
        return;
    }

    if args.abi {
        let abi = match export_abi_by_id(id) {
            Ok(abi) => abi,
            Err(err) => {
                eprintln!("failed to export abi: {err}");
                process::exit(1);
            }
        };
        let json = match serde_json::to_string(&abi) {
            Ok(json) => json,
            Err(err) => {
                eprintln!("failed to encode abi: {err}");
                process::exit(1);
            }
        };
        write_output(&args.out, &json);
        return;
    }

    print_usage(&program);
    process::exit(1);
}
