use anyhow::Result;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "home_finance_web", about = "JSON API for the mortgage calculators")]
struct Opts {
    /// The port to listen on
    #[structopt(long, default_value = "8080")]
    port: u16,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let opt = Opts::from_args();
    home_finance_web::run_server(opt.port)
}
