use anyhow::Result;
use eventspeak::app::Application;

fn main() -> Result<()> {
    eventspeak::init_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let app = Application::new()?;

    if args.is_empty() {
        // interactive mode
        return app.run();
    }

    // one-shot: the whole command line is the sentence
    app.handle_sentence(&args.join(" "));
    Ok(())
}
