use std::process::ExitCode;

fn main() -> ExitCode {
 clipcycle::libmain::main()
}
