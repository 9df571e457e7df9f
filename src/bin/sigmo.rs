use rust_dmr_sigmo::cmdline;

fn main() {
    pretty_env_logger::init();
    let args = std::env::args().collect();
    if let Err(e) = cmdline::launch(args) {
        log::error!("fatal: {:?}", e);
        eprintln!("{}", cmdline::error_text(&e, atty::Stream::Stderr));
        std::process::exit(1);
    }
}
