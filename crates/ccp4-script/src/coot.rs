//! Python extension script loaded by coot at start-up.
//!
//! The script binds the session's paths and constants, installs the key
//! bindings and the menu, then loads the current structures and maps. The
//! `w` binding appends rows to the ledger with `imported = 0`, which is how
//! new models travel back to the host.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use ccp4_core::errors::Ccp4Error;
use ccp4_core::ArtifactKind;
use ccp4_ledger::Ledger;
use tracing::debug;

use crate::support::{write_support_files, COOT_INI, EDITOR};
use crate::template::{render, values};

/// Name of the script inside `extra/`.
pub const SCRIPT_NAME: &str = "cootScript.py";
/// File whose existence ends the interactive session.
pub const SENTINEL_NAME: &str = "STOPPROTOCOL";
/// Names of saved models: run id, model id, version counter.
pub const MODEL_TEMPLATE: &str = "coot_%06d_Imol_%04d_version_%04d.pdb";

/// Everything the script header binds.
#[derive(Debug, Clone, PartialEq)]
pub struct CootScriptContext {
    /// Model written by default.
    pub imol: i64,
    /// Template for saved model paths, see [`MODEL_TEMPLATE`].
    pub output_template: PathBuf,
    pub coot_ini: PathBuf,
    pub editor: PathBuf,
    pub ledger: PathBuf,
    pub table: String,
    pub sentinel: PathBuf,
    pub run_id: u64,
}

impl CootScriptContext {
    /// Context whose files all live in `extra_dir`.
    pub fn in_dir(extra_dir: &Path, ledger: &Path, table: &str, run_id: u64) -> Self {
        Self {
            imol: 0,
            output_template: extra_dir.join(MODEL_TEMPLATE),
            coot_ini: extra_dir.join(COOT_INI),
            editor: extra_dir.join(EDITOR),
            ledger: ledger.to_path_buf(),
            table: table.to_string(),
            sentinel: extra_dir.join(SENTINEL_NAME),
            run_id,
        }
    }
}

/// Quotes `text` as a single-quoted Python literal.
fn py_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

fn py_path(path: &Path) -> String {
    py_str(&path.display().to_string())
}

const HEADER: &str = r#"try:
    import ConfigParser as configparser
except ImportError:
    import configparser
import os
import sqlite3
import coot_python

mydict = {}
mydict['imol'] = {{IMOL}}
mydict['aa_main_chain'] = "A"
mydict['aa_auxiliary_chain'] = "AA"
mydict['aaNumber'] = 17
mydict['step'] = 5
mydict['outfile'] = {{OUTPUT_TEMPLATE}}
cootPath = {{COOT_INI}}
editorPath = {{EDITOR}}
databasePath = {{LEDGER}}
table_name = {{TABLE}}
stopPath = {{SENTINEL}}
TYPE_3DMAP = {{KIND_VOLUME}}
TYPE_ATOMSTRUCT = {{KIND_STRUCTURE}}
runId = {{RUN_ID}}
"#;

const BODY: &str = r#"

def beep(time):
    """Short tone through sox, if it is installed."""
    try:
        os.system("play --no-show-progress -n synth %f sin 880" % time)
    except Exception:
        pass


def doIt(command):
    return eval(command)


def _change_chain_id(signStep):
    """Move one step of residues between the main and auxiliary chains."""
    global mydict
    dic = dict(mydict)
    if signStep < 0:
        dic['fromAaNumber'] = mydict['aaNumber'] - dic['step'] + 1
        dic['toAaNumber'] = mydict['aaNumber']
        dic['fromAaChain'] = mydict['aa_auxiliary_chain']
        dic['toAaChain'] = mydict['aa_main_chain']
    else:
        dic['fromAaNumber'] = mydict['aaNumber']
        dic['toAaNumber'] = mydict['aaNumber'] + dic['step'] - 1
        dic['fromAaChain'] = mydict['aa_main_chain']
        dic['toAaChain'] = mydict['aa_auxiliary_chain']
    mydict['aaNumber'] = mydict['aaNumber'] + (dic['step'] * signStep)
    doIt("change_chain_id(%(imol)d, '%(fromAaChain)s', '%(toAaChain)s', 1, "
         "%(fromAaNumber)d, %(toAaNumber)d)" % dic)


def _refine_zone(signStep):
    """Refine the next (or previous) step of residues."""
    global mydict
    dic = dict(mydict)
    if signStep < 0:
        dic['fromAaNumber'] = mydict['aaNumber'] - dic['step']
        dic['toAaNumber'] = mydict['aaNumber'] + 2
        mydict['aaNumber'] = mydict['aaNumber'] - dic['step']
    else:
        dic['fromAaNumber'] = mydict['aaNumber'] - 2
        dic['toAaNumber'] = mydict['aaNumber'] + dic['step']
        mydict['aaNumber'] = mydict['aaNumber'] + dic['step']
    doIt('refine_zone(%(imol)s, "%(aa_main_chain)s", %(fromAaNumber)d, '
         '%(toAaNumber)d, "")' % dic)


def _updateMol():
    """Edit coot.ini and reload the [myvars] section."""
    global mydict
    iniPath = os.environ.get('COOT_INI', cootPath)
    os.system("unset PYTHONPATH; unset PYTHONHOME; python %s %s" % (editorPath, iniPath))
    config = configparser.ConfigParser()
    config.read(iniPath)
    try:
        mydict['imol'] = int(config.get("myvars", "imol"))
        mydict['aa_main_chain'] = config.get("myvars", "aa_main_chain")
        mydict['aa_auxiliary_chain'] = config.get("myvars", "aa_auxiliary_chain")
        mydict['aaNumber'] = int(config.get("myvars", "aaNumber"))
        mydict['step'] = int(config.get("myvars", "step"))
        mydict['outfile'] = config.get("myvars", "outfile")
    except (configparser.NoOptionError, configparser.NoSectionError):
        pass
    add_status_bar_text("Global variables updated from coot.ini")
    beep(0.1)


def getOutPutFileName(template, imol):
    """First name from the template that does not exist yet."""
    counter = 1
    while os.path.isfile(template % (runId, imol, counter)):
        counter += 1
    return template % (runId, imol, counter)


def storeFileNameDataBase(imol, outFileName, outLabel=None, kind=TYPE_ATOMSTRUCT):
    if outLabel is None:
        outLabel = os.path.splitext(os.path.basename(outFileName))[0]
    conn = sqlite3.connect(databasePath)
    conn.execute("INSERT INTO " + table_name +
                 " (modelId, fileName, labelName, kind, imported)"
                 " VALUES (?, ?, ?, ?, 0)",
                 (imol, outFileName, outLabel, kind))
    conn.commit()
    conn.close()


def _write(imol=-1, outLabel=None):
    """Save a model and record it for import."""
    global mydict
    aa_imol = imol
    if imol == -1:
        with UsingActiveAtom() as [aa_imol, aa_chain_id, aa_res_no, aa_ins_code,
                                   aa_atom_name, aa_alt_conf]:
            print("saving active molecule #%d" % aa_imol)
    dic = dict(mydict)
    dic['imol'] = aa_imol
    outFileName = getOutPutFileName(dic['outfile'], aa_imol)
    dic['outfile'] = outFileName
    save_coordinates(aa_imol, outFileName)
    if os.path.isfile(outFileName):
        storeFileNameDataBase(aa_imol, outFileName, outLabel, TYPE_ATOMSTRUCT)
        add_status_bar_text("Saved imol %(imol)s as %(outfile)s" % dic)
    else:
        dic['outfile'] = outFileName.replace(".pdb", ".mrc")
        doIt("export_map(%(imol)s, '%(outfile)s')" % dic)
        add_status_bar_text("Map exported to %(outfile)s, not recorded" % dic)
    beep(0.1)


def scipion_write(imol=0, outLabel=None):
    """Scripting entry point: save model imol, optionally under a label."""
    global mydict
    mydict['imol'] = imol
    _write(imol, outLabel)


def _printEnv():
    for key in sorted(os.environ.keys()):
        print("%30s %s" % (key, os.environ[key]))


def _finishProj():
    open(stopPath, "w").close()
    beep(0.1)
    coot_real_exit(0)


print("Loading Scipion coot extensions...")

menubar = coot_python.main_menubar()
toolbar = coot_python.main_toolbar()
menu = coot_menubar_menu("Scipion")
add_simple_coot_menu_menuitem(menu, "write last active model", lambda func: _write(imol=-1))
add_simple_coot_menu_menuitem(menu, "end protocol", lambda func: _finishProj())
add_simple_coot_menu_menuitem(menu, "update cootini", lambda func: _updateMol())

add_key_binding("change_chain_id_down", "x", lambda: _change_chain_id(-1))
add_key_binding("change_chain_id_up", "X", lambda: _change_chain_id(1))
add_key_binding("refine zone up", "z", lambda: _refine_zone(1))
add_key_binding("refine zone down", "Z", lambda: _refine_zone(-1))
add_key_binding("init global variables", "U", lambda: _updateMol())
add_key_binding("write pdb file", "w", lambda: _write())
add_key_binding("print environment", "E", lambda: _printEnv())
add_key_binding("finish project", "e", lambda: _finishProj())
"#;

/// Renders the complete extension script.
///
/// `structures` and `volumes` are loaded in order, so structure `i` gets
/// molecule number `i` and volume `j` gets `structures.len() + j`.
pub fn render_extension_script(
    ctx: &CootScriptContext,
    structures: &[String],
    volumes: &[String],
    trailer: &str,
) -> Result<String, Ccp4Error> {
    let header_values = values([
        ("IMOL", ctx.imol.to_string()),
        ("OUTPUT_TEMPLATE", py_path(&ctx.output_template)),
        ("COOT_INI", py_path(&ctx.coot_ini)),
        ("EDITOR", py_path(&ctx.editor)),
        ("LEDGER", py_path(&ctx.ledger)),
        ("TABLE", py_str(&ctx.table)),
        ("SENTINEL", py_path(&ctx.sentinel)),
        ("KIND_VOLUME", ArtifactKind::VolumeMap.code().to_string()),
        ("KIND_STRUCTURE", ArtifactKind::AtomicStructure.code().to_string()),
        ("RUN_ID", ctx.run_id.to_string()),
    ]);
    let mut script = render(HEADER, &header_values)?;
    script.push_str(BODY);

    script.push_str("\n# atomic structures\n");
    for structure in structures {
        let _ = writeln!(script, "read_pdb({})", py_str(structure));
    }
    if !structures.is_empty() {
        script.push_str("set_mol_active(0, 1)\n");
    }

    script.push_str("\n# 3D maps\n");
    script.push_str("map_colour = (0.0, 0.5, 1.0)\n");
    for volume in volumes {
        let _ = writeln!(script, "handle_read_ccp4_map({}, 0)", py_str(volume));
    }
    if !volumes.is_empty() {
        let last = structures.len() + volumes.len() - 1;
        let _ = writeln!(script, "set_map_colour({last}, *map_colour)");
    }

    script.push_str("\n# extra commands\n");
    script.push_str(trailer);
    if !trailer.is_empty() && !trailer.ends_with('\n') {
        script.push('\n');
    }
    Ok(script)
}

/// Writes the script for the ledger's current models, plus coot.ini and the
/// editor helper when they are missing.
pub fn write_extension_script(
    path: &Path,
    ctx: &CootScriptContext,
    ledger: &Ledger,
    trailer: &str,
) -> Result<(), Ccp4Error> {
    let (structures, volumes) = if ledger.table_exists()? {
        (
            ledger.most_recent_per_model(ArtifactKind::AtomicStructure)?,
            ledger.most_recent_per_model(ArtifactKind::VolumeMap)?,
        )
    } else {
        (Vec::new(), Vec::new())
    };
    let script = render_extension_script(ctx, &structures, &volumes, trailer)?;
    fs::write(path, script).map_err(|err| Ccp4Error::io("ccp4_script.write", path, err))?;
    debug!(
        path = %path.display(),
        structures = structures.len(),
        volumes = volumes.len(),
        "wrote coot extension script"
    );
    write_support_files(&ctx.coot_ini, &ctx.editor)?;
    Ok(())
}
