//! Win32 Overlay Window
//!
//! Top-most tool window hosting the floating toolbar. The window runs its own
//! message loop on a dedicated thread; the toolbar talks to it through posted
//! messages and receives pointer input over a channel.

use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use windows::core::w;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetCapture, ReleaseCapture, SetCapture, TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::business::{Point, Size};
use crate::ui::floating_toolbar::{
    Cursor, HitTarget, ToolbarView, CELL_WIDTH, HANDLE_WIDTH, PADDING, TOOLBAR_HEIGHT,
};
use crate::ui::overlay::{OverlayHost, OverlayInput};

const WM_APP_PRESENT: u32 = 0x8000 + 1;
const WM_APP_CAPTURE: u32 = 0x8000 + 2;
const WM_APP_RELEASE: u32 = 0x8000 + 3;

type SharedView = Arc<Mutex<Option<ToolbarView>>>;

thread_local! {
    static VIEW: std::cell::RefCell<Option<SharedView>> = const { std::cell::RefCell::new(None) };
    static EVENT_SENDER: std::cell::RefCell<Option<Sender<OverlayInput>>> = const { std::cell::RefCell::new(None) };
    static PRESSED_TOOL: std::cell::RefCell<Option<String>> = const { std::cell::RefCell::new(None) };
    static HOVERED_TOOL: std::cell::RefCell<Option<String>> = const { std::cell::RefCell::new(None) };
}

/// Overlay host backed by a Win32 layered tool window
pub struct Win32Overlay {
    hwnd: Arc<AtomicIsize>,
    view: SharedView,
}

impl Win32Overlay {
    /// Create the window on its own thread
    pub fn spawn() -> (Self, Receiver<OverlayInput>) {
        let (input_tx, input_rx) = channel();
        let hwnd = Arc::new(AtomicIsize::new(0));
        let view: SharedView = Arc::new(Mutex::new(None));

        let hwnd_store = hwnd.clone();
        let thread_view = view.clone();
        std::thread::spawn(move || run_window(hwnd_store, thread_view, input_tx));

        (Self { hwnd, view }, input_rx)
    }

    fn post(&self, msg: u32) {
        let hwnd_val = self.hwnd.load(Ordering::SeqCst);
        if hwnd_val == 0 {
            return;
        }
        unsafe {
            if let Err(e) = PostMessageW(HWND(hwnd_val), msg, WPARAM(0), LPARAM(0)) {
                tracing::warn!("PostMessageW({:#x}) failed: {:?}", msg, e);
            }
        }
    }
}

impl OverlayHost for Win32Overlay {
    fn viewport(&self) -> Size {
        unsafe {
            Size::new(
                GetSystemMetrics(SM_CXSCREEN) as f64,
                GetSystemMetrics(SM_CYSCREEN) as f64,
            )
        }
    }

    fn measured_size(&self) -> Option<Size> {
        lock(&self.view).as_ref().map(ToolbarView::size)
    }

    fn capture_pointer(&mut self) {
        self.post(WM_APP_CAPTURE);
    }

    fn release_pointer(&mut self) {
        self.post(WM_APP_RELEASE);
    }

    fn present(&mut self, view: Option<&ToolbarView>) {
        *lock(&self.view) = view.cloned();
        self.post(WM_APP_PRESENT);
    }
}

fn lock(view: &SharedView) -> std::sync::MutexGuard<'_, Option<ToolbarView>> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}

fn current_view() -> Option<ToolbarView> {
    VIEW.with(|v| v.borrow().as_ref().and_then(|shared| lock(shared).clone()))
}

fn send(input: OverlayInput) {
    EVENT_SENDER.with(|s| {
        if let Some(ref tx) = *s.borrow() {
            let _ = tx.send(input);
        }
    });
}

/// 0xRRGGBB to a GDI color
fn colorref(rgb: u32) -> COLORREF {
    COLORREF(((rgb & 0xFF) << 16) | (rgb & 0xFF00) | ((rgb >> 16) & 0xFF))
}

fn cursor_point() -> Point {
    let mut pt = POINT::default();
    unsafe {
        let _ = GetCursorPos(&mut pt);
    }
    Point::new(pt.x as f64, pt.y as f64)
}

fn local_point(lparam: LPARAM) -> Point {
    let x = (lparam.0 & 0xFFFF) as u16 as i16;
    let y = ((lparam.0 >> 16) & 0xFFFF) as u16 as i16;
    Point::new(x as f64, y as f64)
}

fn hovered_tool(local: Point) -> Option<String> {
    match current_view()?.hit_test(local) {
        HitTarget::Tool(id) => Some(id),
        _ => None,
    }
}

unsafe fn paint(hwnd: HWND) {
    let mut ps = PAINTSTRUCT::default();
    let hdc = BeginPaint(hwnd, &mut ps);

    if let Some(view) = current_view() {
        let palette = view.palette;
        let mut rect = RECT::default();
        let _ = GetClientRect(hwnd, &mut rect);

        let bg = CreateSolidBrush(colorref(palette.background));
        FillRect(hdc, &rect, bg);
        let _ = DeleteObject(bg);

        let border = CreateSolidBrush(colorref(palette.border));
        FrameRect(hdc, &rect, border);
        let _ = DeleteObject(border);

        // Grip: two columns of three dots
        let grip = CreateSolidBrush(colorref(palette.muted));
        let grip_left = PADDING as i32 + 6;
        let grip_top = (TOOLBAR_HEIGHT as i32 - 12) / 2;
        for column in [0, 6] {
            for row in [0, 5, 10] {
                let dot = RECT {
                    left: grip_left + column,
                    top: grip_top + row,
                    right: grip_left + column + 2,
                    bottom: grip_top + row + 2,
                };
                FillRect(hdc, &dot, grip);
            }
        }
        let _ = DeleteObject(grip);

        SetBkMode(hdc, TRANSPARENT);
        for (i, item) in view.items.iter().enumerate() {
            let left = (PADDING + HANDLE_WIDTH + CELL_WIDTH * i as f64) as i32;
            let cell = RECT {
                left: left + 2,
                top: PADDING as i32,
                right: left + CELL_WIDTH as i32 - 2,
                bottom: TOOLBAR_HEIGHT as i32 - PADDING as i32,
            };

            if item.active {
                let accent = CreateSolidBrush(colorref(palette.accent));
                FillRect(hdc, &cell, accent);
                let _ = DeleteObject(accent);
            } else if item.show_tooltip {
                let hover = CreateSolidBrush(colorref(palette.border));
                FillRect(hdc, &cell, hover);
                let _ = DeleteObject(hover);
            }

            // Icon glyph names are drawn as their initials
            let glyph: String = item
                .icon
                .split('-')
                .filter_map(|part| part.chars().next())
                .take(2)
                .collect::<String>()
                .to_uppercase();
            let text: Vec<u16> = glyph.encode_utf16().collect();
            SetTextColor(hdc, colorref(palette.foreground));
            let _ = TextOutW(hdc, cell.left + 8, cell.top + 12, &text);
        }
    }

    let _ = EndPaint(hwnd, &ps);
}

unsafe fn present(hwnd: HWND) {
    match current_view() {
        Some(view) => {
            let size = view.size();
            let _ = SetWindowPos(
                hwnd,
                HWND_TOPMOST,
                view.position.x as i32,
                view.position.y as i32,
                size.width as i32,
                size.height as i32,
                SWP_NOACTIVATE | SWP_SHOWWINDOW,
            );
            // Tooltip: the hovered tool's label as the window title
            let title = view
                .items
                .iter()
                .find(|item| item.show_tooltip)
                .map(|item| item.label.clone())
                .unwrap_or_default();
            let wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
            let _ = SetWindowTextW(hwnd, windows::core::PCWSTR(wide.as_ptr()));
            let _ = InvalidateRect(hwnd, None, TRUE);
        }
        None => {
            let _ = ShowWindow(hwnd, SW_HIDE);
        }
    }
}

unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    const WM_DESTROY: u32 = 0x0002;
    const WM_PAINT: u32 = 0x000F;
    const WM_SETCURSOR: u32 = 0x0020;
    const WM_MOUSEMOVE: u32 = 0x0200;
    const WM_LBUTTONDOWN: u32 = 0x0201;
    const WM_LBUTTONUP: u32 = 0x0202;
    const WM_CAPTURECHANGED: u32 = 0x0215;
    const WM_MOUSELEAVE: u32 = 0x02A3;

    match msg {
        WM_APP_PRESENT => {
            present(hwnd);
            LRESULT(0)
        }
        WM_APP_CAPTURE => {
            SetCapture(hwnd);
            LRESULT(0)
        }
        WM_APP_RELEASE => {
            if GetCapture() == hwnd {
                let _ = ReleaseCapture();
            }
            LRESULT(0)
        }
        WM_PAINT => {
            paint(hwnd);
            LRESULT(0)
        }
        WM_SETCURSOR => {
            let grabbing = current_view().is_some_and(|view| view.cursor == Cursor::Grabbing);
            if !grabbing {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            }
            if let Ok(cursor) = LoadCursorW(None, IDC_SIZEALL) {
                SetCursor(cursor);
            }
            LRESULT(1)
        }
        WM_LBUTTONDOWN => {
            let local = local_point(lparam);
            let target = current_view()
                .map(|view| view.hit_test(local))
                .unwrap_or(HitTarget::Background);
            PRESSED_TOOL.with(|p| {
                *p.borrow_mut() = match &target {
                    HitTarget::Tool(id) => Some(id.clone()),
                    _ => None,
                }
            });
            send(OverlayInput::PointerDown {
                point: cursor_point(),
                target,
            });
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            if GetCapture() == hwnd {
                send(OverlayInput::PointerMove {
                    point: cursor_point(),
                });
                return LRESULT(0);
            }

            let hovered = hovered_tool(local_point(lparam));
            let changed = HOVERED_TOOL.with(|h| {
                let mut h = h.borrow_mut();
                if *h == hovered {
                    false
                } else {
                    *h = hovered.clone();
                    true
                }
            });
            if changed {
                match hovered {
                    Some(tool_id) => send(OverlayInput::PointerEnter { tool_id }),
                    None => send(OverlayInput::PointerLeave),
                }
                let mut track = TRACKMOUSEEVENT {
                    cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                    dwFlags: TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                let _ = TrackMouseEvent(&mut track);
            }
            LRESULT(0)
        }
        WM_MOUSELEAVE => {
            let had_hover = HOVERED_TOOL.with(|h| h.borrow_mut().take().is_some());
            if had_hover {
                send(OverlayInput::PointerLeave);
            }
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            send(OverlayInput::PointerUp);
            let released_on = hovered_tool(local_point(lparam));
            let pressed = PRESSED_TOOL.with(|p| p.borrow_mut().take());
            if let (Some(pressed), Some(released_on)) = (pressed, released_on) {
                if pressed == released_on {
                    send(OverlayInput::Click { tool_id: pressed });
                }
            }
            LRESULT(0)
        }
        WM_CAPTURECHANGED => {
            // Capture lost to another window ends any drag
            send(OverlayInput::PointerUp);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn run_window(hwnd_store: Arc<AtomicIsize>, view: SharedView, input_tx: Sender<OverlayInput>) {
    VIEW.with(|v| *v.borrow_mut() = Some(view));
    EVENT_SENDER.with(|s| *s.borrow_mut() = Some(input_tx));

    unsafe {
        let inst = match GetModuleHandleW(None) {
            Ok(h) => h,
            Err(e) => {
                tracing::error!("GetModuleHandleW failed: {:?}", e);
                return;
            }
        };

        let cls = w!("OpenAlgoFavoritesToolbar");
        let cursor = LoadCursorW(None, IDC_ARROW).unwrap_or_default();

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            hInstance: inst.into(),
            hCursor: cursor,
            lpszClassName: cls,
            ..Default::default()
        };
        RegisterClassExW(&wc);

        let hwnd = CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
            cls,
            w!("Favorites"),
            WS_POPUP,
            0,
            0,
            0,
            0,
            HWND::default(),
            HMENU::default(),
            inst,
            None,
        );

        if hwnd.0 == 0 {
            tracing::error!("CreateWindowExW failed");
            return;
        }

        hwnd_store.store(hwnd.0, Ordering::SeqCst);
        tracing::info!("Overlay window created");

        // Show whatever was presented before the window existed
        present(hwnd);

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        hwnd_store.store(0, Ordering::SeqCst);
        tracing::info!("Overlay window closed");
    }

    // Dropping the sender tells the toolbar loop the overlay is gone
    EVENT_SENDER.with(|s| s.borrow_mut().take());
}
