//! 实验结果.

use crate::profile::Profile;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Shells built: {}", p.get_built())?;
    writeln!(w, "{S4}Rejected nuclei: {}", p.get_skipped())?;
    writeln!(
        w,
        "{S4}Average build time: {} us",
        f64_to_display(p.get_avg_build_time_us())
    )?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros() as f64);
    writeln!(w, "{S4}Most time-consuming build: {} us", f64_to_display(t))?;
    writeln!(w, "{S4}Full analysis time: {} us", p.get_analysis_time_us())?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    writeln!(
        w,
        "{S4}Average shell area deviation: {}",
        f64_to_display(p.get_avg_deviation())
    )?;
    let (signal, random) = p.get_overall().unzip();
    writeln!(
        w,
        "{S4}Overall shell: signal {}, random {}",
        f64_to_display(signal),
        f64_to_display(random)
    )?;
    write!(w, "{S4}Chi-square p-value: {}", f64_to_display(p.get_p_value()))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(String, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (String, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果. 输出目录可用时, 同时写入 `shrink5.txt`.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut buf).unwrap();
            println!("{}", std::str::from_utf8(&buf).unwrap());
            buf.clear();

            utils::sep();
        }

        if let Some(dir) = utils::loader::out_dir_from_env_or_home() {
            let path = dir.join("shrink5.txt");
            match self.save(&path) {
                Ok(()) => println!("Report saved to {}", path.display()),
                Err(e) => log::warn!("Cannot save report to {}: {e}", path.display()),
            }
        }
    }

    /// 将全部结果写入 `path`.
    fn save(&self, path: &std::path::Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(path)?);
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut w)?;
            writeln!(w)?;
            utils::sep_to(&mut w)?;
        }
        w.flush()
    }
}
