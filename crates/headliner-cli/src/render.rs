// Plain-text output for feed snapshots
use headliner_core::FeedState;

pub fn print_feed(title: &str, state: &FeedState) {
    if let Some(ref message) = state.error {
        eprintln!("{}", message);
        return;
    }

    match state.label {
        Some(ref label) => println!("{} ({})", title, label),
        None => println!("{}", title),
    }
    println!("{}", "=".repeat(title.len()));

    if state.articles.is_empty() {
        println!("Nothing to show.");
        return;
    }

    for (i, article) in state.articles.iter().enumerate() {
        println!("{:>2}. {}", i + 1, article.title);
        println!(
            "    {} | {}",
            article.source_name,
            article.published_at.format("%Y-%m-%d %H:%M UTC")
        );
        if !article.summary.is_empty() {
            println!("    {}", article.summary);
        }
        println!("    {}", article.url);
    }
}
