mod constraints;
mod data;
mod error;
mod indexes;
mod problem;
mod regen;
mod server;
mod solver;
mod time;
mod variables;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    server::run_server().await;
}
