/*!

This is the long-form manual for `vote_timeline` and `hurdle-tracker`.

## The results document

The tracked document is a JSON file, rewritten by its publisher every time new
votes are reported. Every version of it is kept in a revision store (a git
repository for `hurdle-tracker`). The parts that are read are:

```text
{
  "races": [{
    "updated_at": "2020-11-05T14:30:00Z",     // applies to every unit of the race
    "electoral_votes": 16,
    "reporting_units": [{
      "name": "Georgia", "state_abb": "GA",
      "electoral_votes": 16,                  // optional, overrides the race value
      "candidates": [{"nyt_id": "bidenj", "votes": {"total": 2450000}}],
      "total_votes": 4900000, "total_expected_vote": 5000000,
      "precincts_total": 2655, "precincts_reporting": 2600
    }]
  }]
}
```

Every field is optional:
- a unit without a name or abbreviation is called `Unknown`
- missing counts are 0
- a candidate without `nyt_id` gets the empty identifier
- a race without a readable `updated_at` is dated at the Unix epoch (a warning is logged)

Unknown fields are ignored, and a field holding a value of the wrong type (a
string where a count is expected, for example) is treated as missing. A
document that is not JSON, is not an object, or whose `races` is not a list
is malformed: that revision is reported as failed.

## The cache

Parsing hundreds of revisions on every run is slow, so the parsed records of
each revision are stored in the cache directory (`_cache` by default):

```text
_cache/3f/786850e387550fdab836ed7e6dc881de23001b.json
{"version": 2, "rows": [{"timestamp": "2020-11-05T14:30:00Z", "unit_name": "Georgia", ...}]}
```

The revision id is the key. Since ids are content hashes, an entry is never
out of date for its revision. When the record format changes, the schema
version is bumped: all the entries written under another version are ignored
and rebuilt on the next run. Corrupt entries are ignored the same way.
Several runs may share a cache directory: entries are written to a temporary
file and renamed into place.

## The timeline

All the records of all the revisions are sorted by time and grouped by
jurisdiction. The revision store may list revisions in any order. Records
with the same time keep the order in which their revisions were listed: git
lists the newest revision first, so its record comes first.
Successive revisions that did not change a jurisdiction produce identical
records, and these are all kept.

## The hurdle moving average

For each record, the runner-up is the trailing candidate. Its share of the
votes is averaged over the latest 30,000 votes (`--threshold` changes this):
the record itself, then the previous records of the same jurisdiction, the
most recent first, until the window is full. The last record only counts
for the part that fills the window. All partial vote counts are rounded to
whole votes.

Known ambiguity: each previous record contributes the total of its
candidates' votes, not the votes added since the record before it. This is
the behavior of the historical reports and is kept until it can be checked
against real data.
*/
