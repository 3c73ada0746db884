use std::io::Write;

/// Writes a reply to the terminal as it is revealed.
///
/// Reveals carry the cumulative text; only the unseen suffix is written.
pub struct ReplyRenderer<'a> {
    out: &'a mut dyn Write,
    printed: usize,
}

impl<'a> ReplyRenderer<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, printed: 0 }
    }

    /// Resets state for a new reply.
    pub fn clear(&mut self) {
        self.printed = 0;
    }

    pub fn render_reveal(&mut self, text: &str) -> std::io::Result<()> {
        let Some(unseen) = text.get(self.printed..) else {
            return Ok(());
        };
        if unseen.is_empty() {
            return Ok(());
        }
        self.out.write_all(unseen.as_bytes())?;
        self.out.flush()?;
        self.printed = text.len();
        Ok(())
    }

    /// Writes a full line, ending any partially written reply first.
    pub fn render_line(&mut self, line: &str) -> std::io::Result<()> {
        if self.printed > 0 {
            writeln!(self.out)?;
            self.printed = 0;
        }
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_reveal_writes_only_new_text() {
        let mut buffer = Vec::new();
        {
            let mut renderer = ReplyRenderer::new(&mut buffer);
            for text in ["H", "Hi", "Hi", "Hi 😢"] {
                renderer.render_reveal(text).unwrap();
            }
            renderer.render_line("done").unwrap();
        }
        assert_eq!(String::from_utf8(buffer).unwrap(), "Hi 😢\ndone\n");
    }

    #[test]
    fn test_clear_starts_a_new_reply() {
        let mut buffer = Vec::new();
        {
            let mut renderer = ReplyRenderer::new(&mut buffer);
            renderer.render_reveal("one").unwrap();
            renderer.clear();
            renderer.render_reveal("two").unwrap();
        }
        assert_eq!(String::from_utf8(buffer).unwrap(), "onetwo");
    }
}
