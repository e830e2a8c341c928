use std::process::ExitCode;

fn main() -> ExitCode {
    pcregex::run()
}
