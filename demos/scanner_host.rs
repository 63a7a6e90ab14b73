//! Illustrative sketch of a host stream satisfying the runtime contract `lexer.cc` assumes:
//! `get()`, `unget()`, `pos()`. Shaped after `utf32::stream`
//! (`original_source/src/compiler/utf32.hh`), extended with one-deep rewind since longest-match
//! scanning needs to back up over the code point that proved the match was already complete.
//! Not compiled as part of this workspace — nothing here is a `lexgen` dependency.

const EOF_SENTINEL: u32 = 0xFFFF_FFFF;

struct Utf32Stream {
    data: Vec<u32>,
    position: usize,
}

impl Utf32Stream {
    fn new(data: Vec<u32>) -> Self {
        Self { data, position: 0 }
    }

    fn get(&mut self) -> u32 {
        let c = self.data.get(self.position).copied().unwrap_or(EOF_SENTINEL);
        if self.position < self.data.len() {
            self.position += 1;
        }
        c
    }

    fn unget(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    fn pos(&self) -> usize {
        self.position
    }

    fn end(&self) -> bool {
        self.position == self.data.len()
    }
}

fn main() {
    let mut stream = Utf32Stream::new("if x".chars().map(|c| c as u32).collect());
    // A generated `scan` would be called here in a loop until `stream.end()`, each call
    // returning a `token` and advancing `stream` past the matched code points:
    //
    //   while !stream.end() {
    //       let mut length = 0;
    //       let tok = scan(&mut stream, &mut length);
    //       println!("{tok:?} ({length} code points)");
    //   }
    while !stream.end() {
        print!("{}", char::from_u32(stream.get()).unwrap_or('?'));
    }
    println!();
}
