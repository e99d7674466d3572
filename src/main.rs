fn main() {
    if let Err(err) = polisen_feed_lib::run() {
        eprintln!("polisen-feed: {err:#}");
        std::process::exit(1);
    }
}
