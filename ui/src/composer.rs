use std::cell::Cell;
use std::rc::Rc;

/// コメント・投稿の入力欄
pub struct Composer {
    text: String,
    hint: &'static str,
    button: &'static str,
    sending: Rc<Cell<bool>>,
}

impl Composer {
    pub fn new(hint: &'static str, button: &'static str) -> Self {
        Self {
            text: String::new(),
            hint,
            button,
            sending: Rc::new(Cell::new(false)),
        }
    }

    /// 入力欄を表示
    /// 送信ボタンが押されたら Some(content) を返す
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<String> {
        let mut should_send = false;

        ui.vertical(|ui| {
            let response = ui.add(
                egui::TextEdit::multiline(&mut self.text)
                    .desired_width(f32::INFINITY)
                    .desired_rows(2)
                    .hint_text(self.hint),
            );

            // Enter + Ctrl/Cmd で送信
            if response.has_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.command)
            {
                should_send = true;
            }

            ui.horizontal(|ui| {
                let enabled = !self.sending.get() && !self.text.trim().is_empty();
                if ui.add_enabled(enabled, egui::Button::new(self.button)).clicked() {
                    should_send = true;
                }
                if self.sending.get() {
                    ui.spinner();
                }
            });
        });

        if should_send {
            self.take()
        } else {
            None
        }
    }

    /// 空白のみの入力は送らない
    fn take(&mut self) -> Option<String> {
        if self.sending.get() || self.text.trim().is_empty() {
            return None;
        }
        let content = self.text.trim().to_string();
        self.text.clear();
        Some(content)
    }

    /// 送信中フラグ。送信完了時に非同期側から下ろす
    pub fn sending_flag(&self) -> Rc<Cell<bool>> {
        self.sending.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_skips_blank_input() {
        let mut composer = Composer::new("Add a comment...", "Comment");
        composer.text = "   \n".to_string();
        assert_eq!(composer.take(), None);

        composer.text = " first! ".to_string();
        assert_eq!(composer.take().as_deref(), Some("first!"));
        assert!(composer.text.is_empty());
    }

    #[test]
    fn test_take_while_sending() {
        let mut composer = Composer::new("What's happening?", "Post");
        composer.text = "hello".to_string();
        composer.sending_flag().set(true);
        assert_eq!(composer.take(), None);
        assert_eq!(composer.text, "hello");
    }
}
