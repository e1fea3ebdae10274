// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("This example is only supported on Windows");
}

#[cfg(target_os = "windows")]
fn main() {
    use file_dropper::{FileDropper, FilterPolicy, TargetWindow};

    use winit::{
        application::ApplicationHandler,
        dpi::LogicalSize,
        event::{ElementState, KeyEvent, WindowEvent},
        event_loop::{ActiveEventLoop, EventLoop},
        keyboard::{Key, NamedKey},
        platform::windows::WindowAttributesExtWindows,
        window::{Window, WindowId},
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("file_dropper=debug"))
        .init();

    let event_loop = EventLoop::new().unwrap();

    struct Application {
        window: Option<Window>,
        dropper: FileDropper,
        shown: String,
    }

    impl Application {
        fn print_files(&mut self) {
            let files = self.dropper.files();
            if files != self.shown {
                println!("--> Dropped files:\n{files}");
                self.shown = files;
            }
        }
    }

    impl ApplicationHandler for Application {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            let window = event_loop
                .create_window(
                    Window::default_attributes()
                        .with_inner_size(LogicalSize::new(400., 100.))
                        .with_title("Drop files here")
                        // winit registers an OLE drop target otherwise, which swallows WM_DROPFILES
                        .with_drag_and_drop(false),
                )
                .unwrap();

            self.dropper
                .set_window(Some(TargetWindow::from_window(&window).unwrap()))
                .unwrap();
            self.dropper.set_enabled(true).unwrap();
            self.window = Some(window);
        }

        fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::Focused(true) => self.print_files(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => match logical_key {
                    // only the first image
                    Key::Character(c) if c.as_str() == "1" => {
                        self.dropper.set_filter(
                            FilterPolicy::new("*.png;*.jpg")
                                .allow_directories(false)
                                .allow_multiple(false),
                        );
                        self.print_files();
                    }
                    Key::Character(c) if c.as_str() == "a" => {
                        self.dropper.set_filter(FilterPolicy::default());
                        self.print_files();
                    }
                    Key::Named(NamedKey::Escape) => {
                        self.dropper.set_enabled(false).unwrap();
                        self.dropper.set_enabled(true).unwrap();
                        self.print_files();
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    let mut app = Application {
        window: None,
        dropper: FileDropper::new(),
        shown: String::new(),
    };
    event_loop.run_app(&mut app).unwrap();
}
