//! Helper files the coot extension script relies on.

use std::fs;
use std::path::Path;

use ccp4_core::errors::Ccp4Error;
use tracing::debug;

/// Name of the variables file inside `extra/`.
pub const COOT_INI: &str = "coot.ini";
/// Name of the editor helper inside `extra/`.
pub const EDITOR: &str = "editor.py";

/// Initial contents of the variables file read by the `U` binding.
pub const COOT_INI_DEFAULT: &str = "[myvars]
imol: 0
aa_main_chain: A
aa_auxiliary_chain: AA
aaNumber: 100
step: 10
";

/// Minimal Tk text editor used to edit the variables file from coot.
pub const EDITOR_SCRIPT: &str = r#"import sys
import tkinter as tk
from tkinter import ttk


def save_file():
    with open(path, 'w') as f:
        f.write(text_area.get('1.0', tk.END))
    text_area.edit_modified(0)


path = sys.argv[1]
main_window = tk.Tk()
main_window.title('Notepad - ' + path)
main_window.geometry('800x600')

menubar = tk.Menu(main_window)
file_menu = tk.Menu(menubar, tearoff=0)
file_menu.add_command(label="Save", command=save_file)
file_menu.add_command(label="Exit", command=main_window.quit)
menubar.add_cascade(label="File", menu=file_menu)

text_area = tk.Text(main_window)
text_area.pack(expand=tk.YES, fill=tk.BOTH, side=tk.LEFT)
scroll_bar = ttk.Scrollbar(main_window, orient=tk.VERTICAL, command=text_area.yview)
scroll_bar.pack(fill=tk.Y, side=tk.RIGHT)
text_area['yscrollcommand'] = scroll_bar.set
main_window.config(menu=menubar)

with open(path, 'r') as f:
    text_area.delete('1.0', tk.END)
    text_area.insert('1.0', f.read())
    text_area.edit_modified(0)

tk.mainloop()
"#;

/// Writes `contents` to `path` unless the file already exists.
///
/// Returns whether the file was written.
pub fn write_if_absent(path: &Path, contents: &str) -> Result<bool, Ccp4Error> {
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, contents).map_err(|err| Ccp4Error::io("ccp4_script.write", path, err))?;
    debug!(path = %path.display(), "wrote support file");
    Ok(true)
}

/// Writes the variables file and the editor helper when missing.
pub fn write_support_files(coot_ini: &Path, editor: &Path) -> Result<(), Ccp4Error> {
    write_if_absent(coot_ini, COOT_INI_DEFAULT)?;
    write_if_absent(editor, EDITOR_SCRIPT)?;
    Ok(())
}
