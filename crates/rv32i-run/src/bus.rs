//! Device map seen by guest programs.
//!
//! | Address                 | Device                                      |
//! |-------------------------|---------------------------------------------|
//! | `0x000000..0x100000`    | RAM                                         |
//! | `0x100000` write        | console output byte                         |
//! | `0x100001` read         | next queued key, 0 when none                |
//! | `0x100001` write        | debug byte                                  |
//! | `0x100002` write        | audio note, `0x80` silences                 |
//! | `0x100004..0x100008`    | milliseconds since start, little-endian     |
//! | `0x100008..0x10000A`    | cursor column, little-endian                |
//! | `0x10000A..0x10000C`    | cursor row, little-endian                   |
//! | `0x100010..`            | program image, repeating every 1 MiB        |

use std::collections::VecDeque;
use std::io::Write;
use std::time::Instant;

use rv32i_core::{AddressSpace, FlatMemory};

use crate::config::HostConfig;
use crate::keyboard::KEY_BACKSPACE;

/// RAM size and the start of the IO window.
pub const RAM_SIZE: u32 = 0x10_0000;
/// Console output register.
pub const IO_CONSOLE: u32 = RAM_SIZE;
/// Keyboard input (read) and debug output (write) register.
pub const IO_KEYBOARD: u32 = RAM_SIZE + 1;
/// Audio note register.
pub const IO_AUDIO: u32 = RAM_SIZE + 2;
/// Millisecond timestamp register.
pub const IO_TIMER: u32 = RAM_SIZE + 4;
/// Cursor column register.
pub const IO_CURSOR_X: u32 = RAM_SIZE + 8;
/// Cursor row register.
pub const IO_CURSOR_Y: u32 = RAM_SIZE + 10;
/// First byte of the program image.
pub const ROM_BASE: u32 = RAM_SIZE + 16;
/// Audio value that stops the current note.
pub const AUDIO_SILENCE: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

impl Cursor {
    const fn clamp(&mut self) {
        let max_x = self.width.saturating_sub(1);
        let max_y = self.height.saturating_sub(1);
        if self.x > max_x {
            self.x = max_x;
        }
        if self.y > max_y {
            self.y = max_y;
        }
    }

    const fn new_line(&mut self) {
        self.x = 0;
        self.y = self.y.saturating_add(1);
        self.clamp();
    }

    const fn advance(&mut self) {
        self.x = self.x.saturating_add(1);
        if self.x >= self.width {
            self.new_line();
        }
    }
}

/// RAM, program image and memory-mapped devices behind one address space.
///
/// Console bytes go to `W`. Keys are queued by the host with
/// [`DeviceBus::push_keys`] and handed to the guest one per read.
#[derive(Debug)]
pub struct DeviceBus<W: Write> {
    ram: FlatMemory,
    rom: Vec<u8>,
    keys: VecDeque<u8>,
    console: W,
    cursor: Cursor,
    audio: u8,
    started: Instant,
}

impl<W: Write> DeviceBus<W> {
    /// Builds the device map around `rom`, writing console output to `console`.
    #[must_use]
    pub fn new(rom: Vec<u8>, console: W, config: &HostConfig) -> Self {
        Self {
            ram: FlatMemory::new(RAM_SIZE as usize),
            rom,
            keys: VecDeque::new(),
            console,
            cursor: Cursor {
                x: 0,
                y: 0,
                width: config.terminal_width.max(1),
                height: config.terminal_height.max(1),
            },
            audio: AUDIO_SILENCE,
            started: Instant::now(),
        }
    }

    /// Queues key codes for the keyboard register.
    pub fn push_keys(&mut self, keys: &[u8]) {
        self.keys.extend(keys);
    }

    /// Number of keys not yet read by the guest.
    #[must_use]
    pub fn pending_keys(&self) -> usize {
        self.keys.len()
    }

    /// Current cursor position as `(column, row)`.
    #[must_use]
    pub const fn cursor(&self) -> (u16, u16) {
        (self.cursor.x, self.cursor.y)
    }

    /// Last value written to the audio register.
    #[must_use]
    pub const fn audio(&self) -> u8 {
        self.audio
    }

    /// Borrows RAM.
    #[must_use]
    pub const fn ram(&self) -> &FlatMemory {
        &self.ram
    }

    /// Flushes buffered console output.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error.
    pub fn flush_console(&mut self) -> std::io::Result<()> {
        self.console.flush()
    }

    /// Consumes the bus and returns the console sink.
    pub fn into_console(self) -> W {
        self.console
    }

    fn millis(&self) -> u32 {
        let ms = self.started.elapsed().as_millis() % (1 << 32);
        u32::try_from(ms).unwrap_or_default()
    }

    fn emit(&mut self, bytes: &[u8]) {
        if let Err(err) = self.console.write_all(bytes) {
            log::warn!("console write failed: {err}");
        }
    }

    fn console_out(&mut self, value: u8) {
        match value {
            KEY_BACKSPACE => {
                self.cursor.x = self.cursor.x.saturating_sub(1);
                self.emit(b"\x08 \x08");
            }
            b'\n' => {
                self.cursor.new_line();
                self.emit(b"\n");
            }
            _ => {
                self.cursor.advance();
                self.emit(&[value]);
            }
        }
    }

    fn move_cursor(&mut self) {
        self.cursor.clamp();
        let row = u32::from(self.cursor.y) + 1;
        let col = u32::from(self.cursor.x) + 1;
        self.emit(format!("\x1b[{row};{col}H").as_bytes());
    }

    fn audio_out(&mut self, value: u8) {
        self.audio = value;
        if value == AUDIO_SILENCE {
            log::info!("audio: silence");
        } else {
            log::info!("audio: note {value:#04x}");
        }
    }

    fn read_io(&mut self, addr: u32) -> u8 {
        let offset = addr - IO_CONSOLE;
        match addr {
            IO_KEYBOARD => self.keys.pop_front().unwrap_or(0),
            IO_TIMER..=0x0010_0007 => self.millis().to_le_bytes()[(offset - 4) as usize],
            IO_CURSOR_X | 0x0010_0009 => self.cursor.x.to_le_bytes()[(offset - 8) as usize],
            IO_CURSOR_Y | 0x0010_000B => self.cursor.y.to_le_bytes()[(offset - 10) as usize],
            _ => 0,
        }
    }

    fn write_io(&mut self, addr: u32, value: u8) {
        match addr {
            IO_CONSOLE => self.console_out(value),
            IO_KEYBOARD => log::info!("debug: {value}"),
            IO_AUDIO => self.audio_out(value),
            IO_CURSOR_X | 0x0010_0009 => {
                let mut bytes = self.cursor.x.to_le_bytes();
                bytes[(addr - IO_CURSOR_X) as usize] = value;
                self.cursor.x = u16::from_le_bytes(bytes);
                self.move_cursor();
            }
            IO_CURSOR_Y | 0x0010_000B => {
                let mut bytes = self.cursor.y.to_le_bytes();
                bytes[(addr - IO_CURSOR_Y) as usize] = value;
                self.cursor.y = u16::from_le_bytes(bytes);
                self.move_cursor();
            }
            _ => {}
        }
    }
}

impl<W: Write> AddressSpace for DeviceBus<W> {
    fn read_byte(&mut self, addr: u32) -> u8 {
        if addr < RAM_SIZE {
            self.ram.read_byte(addr)
        } else if addr < ROM_BASE {
            self.read_io(addr)
        } else {
            let index = ((addr - ROM_BASE) % RAM_SIZE) as usize;
            self.rom.get(index).copied().unwrap_or(0)
        }
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        if addr < RAM_SIZE {
            self.ram.write_byte(addr, value);
        } else if addr < ROM_BASE {
            self.write_io(addr, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DeviceBus, AUDIO_SILENCE, IO_AUDIO, IO_CONSOLE, IO_CURSOR_X, IO_CURSOR_Y, IO_KEYBOARD,
        IO_TIMER, RAM_SIZE, ROM_BASE,
    };
    use crate::config::HostConfig;
    use rv32i_core::{read_u16_le, read_u32_le, write_u16_le, AddressSpace};

    fn bus(rom: &[u8]) -> DeviceBus<Vec<u8>> {
        DeviceBus::new(rom.to_vec(), Vec::new(), &HostConfig::default())
    }

    #[test]
    fn ram_is_read_write_below_the_io_window() {
        let mut bus = bus(&[]);
        bus.write_byte(0, 0x11);
        bus.write_byte(RAM_SIZE - 1, 0x22);

        assert_eq!(bus.read_byte(0), 0x11);
        assert_eq!(bus.read_byte(RAM_SIZE - 1), 0x22);
        assert_eq!(bus.ram().as_slice()[0], 0x11);
    }

    #[test]
    fn rom_is_read_only_and_repeats_every_megabyte() {
        let mut bus = bus(&[1, 2, 3]);

        assert_eq!(bus.read_byte(ROM_BASE), 1);
        assert_eq!(bus.read_byte(ROM_BASE + 2), 3);
        assert_eq!(bus.read_byte(ROM_BASE + 3), 0);
        assert_eq!(bus.read_byte(ROM_BASE + RAM_SIZE + 1), 2);

        bus.write_byte(ROM_BASE, 0xFF);
        assert_eq!(bus.read_byte(ROM_BASE), 1);
    }

    #[test]
    fn console_bytes_reach_the_sink() {
        let mut bus = bus(&[]);
        for &b in b"hi\n" {
            bus.write_byte(IO_CONSOLE, b);
        }
        bus.write_byte(IO_CONSOLE, b'x');
        bus.write_byte(IO_CONSOLE, 0x7F);

        assert_eq!(bus.cursor(), (0, 1));
        assert_eq!(bus.into_console(), b"hi\nx\x08 \x08");
    }

    #[test]
    fn keyboard_dequeues_one_key_per_read() {
        let mut bus = bus(&[]);
        bus.push_keys(b"ab");

        assert_eq!(bus.read_byte(IO_KEYBOARD), b'a');
        assert_eq!(bus.pending_keys(), 1);
        assert_eq!(bus.read_byte(IO_KEYBOARD), b'b');
        assert_eq!(bus.read_byte(IO_KEYBOARD), 0);
    }

    #[test]
    fn debug_writes_do_not_touch_the_console() {
        let mut bus = bus(&[]);
        bus.write_byte(IO_KEYBOARD, 42);
        assert!(bus.into_console().is_empty());
    }

    #[test]
    fn audio_register_remembers_the_last_note() {
        let mut bus = bus(&[]);
        assert_eq!(bus.audio(), AUDIO_SILENCE);
        bus.write_byte(IO_AUDIO, 0x3C);
        assert_eq!(bus.audio(), 0x3C);
        assert_eq!(bus.read_byte(IO_AUDIO), 0);
    }

    #[test]
    fn timer_counts_up_from_start() {
        let mut bus = bus(&[]);
        let first = read_u32_le(&mut bus, IO_TIMER);
        let second = read_u32_le(&mut bus, IO_TIMER);

        assert!(first < 60_000);
        assert!(second >= first);
    }

    #[test]
    fn cursor_writes_clamp_to_the_terminal() {
        let mut bus = bus(&[]);
        write_u16_le(&mut bus, IO_CURSOR_X, 10);
        write_u16_le(&mut bus, IO_CURSOR_Y, 3);
        assert_eq!(bus.cursor(), (10, 3));
        assert_eq!(read_u16_le(&mut bus, IO_CURSOR_X), 10);
        assert_eq!(read_u16_le(&mut bus, IO_CURSOR_Y), 3);

        write_u16_le(&mut bus, IO_CURSOR_X, 500);
        write_u16_le(&mut bus, IO_CURSOR_Y, 500);
        assert_eq!(bus.cursor(), (79, 23));

        let console = bus.into_console();
        assert!(console.ends_with(b"\x1b[24;80H"));
    }

    #[test]
    fn console_wraps_at_terminal_width() {
        let config = HostConfig {
            terminal_width: 4,
            terminal_height: 2,
            ..HostConfig::default()
        };
        let mut bus = DeviceBus::new(Vec::new(), Vec::new(), &config);
        for &b in b"abcdefghij" {
            bus.write_byte(IO_CONSOLE, b);
        }
        assert_eq!(bus.cursor(), (2, 1));
    }

    #[test]
    fn unmapped_io_reads_zero() {
        let mut bus = bus(&[]);
        for addr in [IO_CONSOLE, IO_AUDIO, IO_AUDIO + 1, ROM_BASE - 4, ROM_BASE - 1] {
            assert_eq!(bus.read_byte(addr), 0, "{addr:#x}");
        }
    }
}
