use async_trait::async_trait;
use beatshift::{error::Result, ConfirmationPort};
use shared::report::{ClassCounts, Completion, Listing};
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout},
    sync::Mutex,
};

/// Confirmation port on a line-oriented terminal. Pre-set answers skip the question.
pub struct TerminalPrompt<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    auto_list: bool,
    auto_confirm: bool,
}

impl TerminalPrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio(auto_list: bool, auto_confirm: bool) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout(), auto_list, auto_confirm)
    }
}

impl<R, W> TerminalPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W, auto_list: bool, auto_confirm: bool) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            auto_list,
            auto_confirm,
        }
    }

    async fn write(&self, text: &str) -> Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
        Ok(())
    }

    /// End of input or anything but y/yes is a no.
    async fn ask(&self, question: &str) -> Result<bool> {
        self.write(&format!("{question} [y/N] ")).await?;
        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            self.write("\n").await?;
            return Ok(false);
        }
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output.into_inner()
    }
}

fn section(title: &str, items: &[String]) -> String {
    let mut text = format!("\n{title} ({}):\n", items.len());
    for item in items {
        text.push_str(&format!("  - {item}\n"));
    }
    text
}

#[async_trait]
impl<R, W> ConfirmationPort for TerminalPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn report_summary(&self, counts: &ClassCounts) -> Result<()> {
        self.write(&format!(
            "\nScanned {} tracks\n  🚫 Not available:  {}\n  🆗 Already exists: {}\n  ✨ Ready:          {}\n",
            counts.processed(),
            counts.not_available,
            counts.already_exists,
            counts.ready
        ))
        .await
    }

    async fn request_listing(&self) -> Result<bool> {
        if self.auto_list {
            return Ok(true);
        }
        self.ask("Show full listings?").await
    }

    async fn show_listing(&self, listing: &Listing) -> Result<()> {
        let text = [
            section("Not available", &listing.not_available),
            section("Already exists", &listing.already_exists),
            section("Ready", &listing.ready),
        ]
        .concat();
        self.write(&text).await
    }

    async fn confirm(&self, counts: &ClassCounts) -> Result<bool> {
        if self.auto_confirm {
            return Ok(true);
        }
        self.ask(&format!("Continue with migration of {} tracks?", counts.ready))
            .await
    }

    async fn report_completion(&self, completion: &Completion) -> Result<()> {
        self.write(&format!(
            "✅ Saved {}/{} tracks\n",
            completion.done, completion.ready
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(input: &'static str) -> TerminalPrompt<&'static [u8], Vec<u8>> {
        TerminalPrompt::new(input.as_bytes(), Vec::new(), false, false)
    }

    fn counts(ready: usize) -> ClassCounts {
        ClassCounts {
            not_available: 1,
            already_exists: 2,
            ready,
        }
    }

    #[tokio::test]
    async fn yes_confirms() {
        let prompt = prompt("yes\n");
        assert!(prompt.confirm(&counts(3)).await.unwrap());
        let output = String::from_utf8(prompt.into_output()).unwrap();
        assert!(output.contains("Continue with migration of 3 tracks? [y/N]"));
    }

    #[tokio::test]
    async fn anything_else_declines() {
        assert!(!prompt("n\n").confirm(&counts(3)).await.unwrap());
        assert!(!prompt("sure\n").confirm(&counts(3)).await.unwrap());
    }

    #[tokio::test]
    async fn end_of_input_declines() {
        assert!(!prompt("").confirm(&counts(3)).await.unwrap());
        assert!(!prompt("").request_listing().await.unwrap());
    }

    #[tokio::test]
    async fn answers_are_read_in_order() {
        let prompt = prompt("y\nn\n");
        assert!(prompt.request_listing().await.unwrap());
        assert!(!prompt.confirm(&counts(1)).await.unwrap());
    }

    #[tokio::test]
    async fn preset_answers_skip_questions() {
        let prompt = TerminalPrompt::new("".as_bytes(), Vec::new(), true, true);
        assert!(prompt.request_listing().await.unwrap());
        assert!(prompt.confirm(&counts(1)).await.unwrap());
        assert!(prompt.into_output().is_empty());
    }

    #[tokio::test]
    async fn summary_and_listing_are_printed() {
        let prompt = prompt("");
        prompt.report_summary(&counts(4)).await.unwrap();
        prompt
            .show_listing(&Listing {
                not_available: vec!["Unknown - Track".to_string()],
                already_exists: vec![],
                ready: vec!["Metrik - Freefall (VIP Mix)".to_string()],
            })
            .await
            .unwrap();

        let output = String::from_utf8(prompt.into_output()).unwrap();
        assert!(output.contains("Scanned 7 tracks"));
        assert!(output.contains("Ready (1):\n  - Metrik - Freefall (VIP Mix)\n"));
        assert!(output.contains("Not available (1):\n  - Unknown - Track\n"));
    }
}
