use std::process;

fn main() {
    match report_render_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("report-render error: {err:#}");
            process::exit(report_render_cli::ExitCode::Failure as i32);
        }
    }
}
