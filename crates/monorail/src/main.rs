use std::process::ExitCode;

fn main() -> ExitCode {
    monorail_lib::main()
}
