use crate::cli::ShowArgs;
use crate::output::render_paper;
use crate::store::{load_paper, PaperStore, SqliteStore};

pub async fn execute(args: ShowArgs) -> anyhow::Result<()> {
    if !args.store.exists() {
        anyhow::bail!("Store {} does not exist", args.store.display());
    }
    let store = SqliteStore::open(&args.store).await?;

    match args.id {
        Some(id) => {
            let paper = load_paper(&store, id).await?;
            print!("{}", render_paper(&paper));
        }
        None => {
            let papers = store.list_papers().await?;
            if papers.is_empty() {
                println!("No papers in {}", args.store.display());
            }
            for paper in papers {
                let title = paper
                    .details
                    .map(|d| d.title)
                    .unwrap_or_else(|| "(no details)".to_string());
                println!(
                    "{:>4}  {}  {} chapters  {}",
                    paper.id,
                    paper.created_at,
                    paper.chapter_ids.len(),
                    title
                );
            }
        }
    }
    Ok(())
}
