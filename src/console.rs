/// Hides the console window the process was started with. Does nothing outside Windows.
#[cfg(windows)]
pub fn hide_console() {
    use windows::Win32::System::Console::GetConsoleWindow;
    use windows::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_HIDE};

    // SAFETY: the handle comes straight from GetConsoleWindow and is checked for null.
    unsafe {
        let console = GetConsoleWindow();
        if console.0 != 0 {
            let _ = ShowWindow(console, SW_HIDE);
        }
    }
}

#[cfg(not(windows))]
pub fn hide_console() {
    log::debug!("hide_console has no effect on this platform");
}
