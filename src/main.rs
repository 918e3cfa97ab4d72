use std::process::ExitCode;

fn main() -> ExitCode {
    match covid_explorer::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render_chain());
            ExitCode::from(err.exit_code())
        }
    }
}
