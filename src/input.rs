use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    ToggleFocus,
    Up,
    Down,
    NextOption,
    PrevOption,
    ClearField,
    Merge,
    FetchPods,
    FetchSecrets,
    FetchDeployments,
    LoadLogs,
    Describe,
    NextTab,
    PrevTab,
    SwitchTab(u8),
    Select,
    StartFilter,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Filter => map_filter_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Tab => Some(Action::ToggleFocus),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Right => Some(Action::NextOption),
        KeyCode::Left => Some(Action::PrevOption),
        KeyCode::Char('x') | KeyCode::Backspace | KeyCode::Delete => Some(Action::ClearField),
        KeyCode::Char('m') if key.modifiers.is_empty() => Some(Action::Merge),
        KeyCode::Char('p') => Some(Action::FetchPods),
        KeyCode::Char('s') => Some(Action::FetchSecrets),
        KeyCode::Char('D') => Some(Action::FetchDeployments),
        KeyCode::Char('l') => Some(Action::LoadLogs),
        KeyCode::Char('d') if key.modifiers.is_empty() => Some(Action::Describe),
        KeyCode::Char(']') => Some(Action::NextTab),
        KeyCode::Char('[') => Some(Action::PrevTab),
        KeyCode::Char(c @ '1'..='6') => c
            .to_digit(10)
            .and_then(|digit| u8::try_from(digit - 1).ok())
            .map(Action::SwitchTab),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Char('/') => Some(Action::StartFilter),
        _ => None,
    }
}

fn map_filter_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
        assert_eq!(map_key(InputMode::Filter, key), Some(Action::Quit));
    }

    #[test]
    fn filter_mode_maps_char() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Filter, key), Some(Action::InputChar('q')));
    }

    #[test]
    fn digits_switch_to_zero_based_tabs() {
        let key = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchTab(0)));
        let key = KeyEvent::new(KeyCode::Char('6'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchTab(5)));
        let key = KeyEvent::new(KeyCode::Char('7'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), None);
    }

    #[test]
    fn shift_d_fetches_deployments_and_d_describes() {
        let shifted = KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT);
        let plain = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputMode::Normal, shifted),
            Some(Action::FetchDeployments)
        );
        assert_eq!(map_key(InputMode::Normal, plain), Some(Action::Describe));
    }

    #[test]
    fn arrows_cycle_selector_options() {
        let right = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        let left = KeyEvent::new(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, right), Some(Action::NextOption));
        assert_eq!(map_key(InputMode::Normal, left), Some(Action::PrevOption));
    }
}
